//! The metadata root: signature, version string, and the stream directory.

use std::sync::OnceLock;

use crate::{
    file::io::{read_le, read_le_at},
    metadata::streams::StreamHeader,
    Error::OutOfBounds,
    Result,
};

/// Magic signature of the physical metadata root (`BSJB`).
pub const METADATA_MAGIC: u32 = 0x424A_5342;

/// Magic signature of the pre-v1 legacy metadata format. Recognized so it can
/// be rejected with a distinct error rather than a generic malformation.
pub const METADATA_MAGIC_LEGACY: u32 = 0x424A_5341;

/// The root header of a metadata blob.
///
/// Construction validates the fixed header (signature, version string length)
/// up front and either succeeds completely or fails with an `Err`; there is no
/// partially usable root. The stream directory that follows the header is
/// parsed lazily on the first [`Root::streams`] call and cached.
///
/// # Examples
///
/// ```rust,no_run
/// use metascope::metadata::root::Root;
/// # fn example(data: &[u8]) -> metascope::Result<()> {
/// let root = Root::read(data)?;
/// println!("version: {}", root.version);
/// for stream in root.streams()? {
///     println!("{} at {:#x}, {} bytes", stream.name, stream.offset, stream.size);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Root<'a> {
    /// Magic signature, always [`METADATA_MAGIC`]
    pub signature: u32,
    /// `MajorVersion`, 1 for all current images
    pub major_version: u16,
    /// `MinorVersion`, 1 for all current images
    pub minor_version: u16,
    /// The version string, null padding stripped
    pub version: String,
    /// Reserved flags, always 0
    pub flags: u16,
    /// Declared number of stream directory entries, may be 0
    pub stream_count: u16,
    /// The full metadata region this root describes
    data: &'a [u8],
    /// Byte offset of the first stream directory entry
    directory_offset: usize,
    headers: OnceLock<Vec<StreamHeader>>,
}

impl<'a> Root<'a> {
    /// Parses and validates the root header at the start of `data`.
    ///
    /// # Errors
    /// - [`crate::Error::NotSupported`] for the legacy pre-v1 signature.
    /// - [`crate::Error::Malformed`] for any other wrong signature, or a
    ///   version string length that does not fit the buffer.
    /// - [`crate::Error::OutOfBounds`] if the buffer is shorter than the
    ///   fixed header.
    pub fn read(data: &'a [u8]) -> Result<Root<'a>> {
        if data.len() < 20 {
            return Err(OutOfBounds);
        }

        let signature = read_le::<u32>(data)?;
        if signature != METADATA_MAGIC {
            if signature == METADATA_MAGIC_LEGACY {
                return Err(crate::Error::NotSupported);
            }
            return Err(malformed_error!(
                "Metadata signature does not match - {:#010X}",
                signature
            ));
        }

        let version_length = read_le::<u32>(&data[12..])? as usize;
        let Some(version_end) = version_length.checked_add(16) else {
            return Err(malformed_error!(
                "Version string length causing integer overflow - {}",
                version_length
            ));
        };
        if version_end + 4 > data.len() {
            return Err(OutOfBounds);
        }

        let version_bytes = &data[16..version_end];
        let version_raw = version_bytes
            .split(|&byte| byte == 0)
            .next()
            .unwrap_or_default();
        let version = std::str::from_utf8(version_raw)
            .map_err(|_| malformed_error!("Version string is not valid UTF-8"))?
            .to_string();

        let flags = read_le::<u16>(&data[version_end..])?;
        let stream_count = read_le_at::<u16>(data, &mut (version_end + 2))?;

        Ok(Root {
            signature,
            major_version: read_le::<u16>(&data[4..])?,
            minor_version: read_le::<u16>(&data[6..])?,
            version,
            flags,
            stream_count,
            data,
            directory_offset: version_end + 4,
            headers: OnceLock::new(),
        })
    }

    /// Returns the stream directory, parsing and caching it on first call.
    ///
    /// A declared count of zero yields an empty directory, not an error.
    /// Each entry is validated: known name, and `offset + size` within the
    /// metadata region.
    ///
    /// # Errors
    /// Returns an error if an entry is malformed or points outside the
    /// region. A failed parse is not cached; a later call re-parses.
    pub fn streams(&self) -> Result<&[StreamHeader]> {
        if let Some(headers) = self.headers.get() {
            return Ok(headers);
        }

        let parsed = self.parse_directory()?;
        let _ = self.headers.set(parsed);
        match self.headers.get() {
            Some(headers) => Ok(headers),
            // set + get on the same OnceLock cannot miss
            None => Err(crate::Error::Error(
                "Stream directory unavailable after parse".to_string(),
            )),
        }
    }

    /// Returns the raw bytes of the named stream, `None` when absent.
    ///
    /// # Errors
    /// Propagates directory parse errors from [`Root::streams`].
    pub fn stream_data(&self, name: &str) -> Result<Option<&'a [u8]>> {
        for header in self.streams()? {
            if header.name == name {
                let start = header.offset as usize;
                let end = start + header.size as usize;
                return Ok(Some(&self.data[start..end]));
            }
        }

        Ok(None)
    }

    fn parse_directory(&self) -> Result<Vec<StreamHeader>> {
        let mut headers = Vec::with_capacity(self.stream_count as usize);
        let mut offset = self.directory_offset;

        for _ in 0..self.stream_count {
            if offset > self.data.len() {
                return Err(OutOfBounds);
            }

            let header = StreamHeader::from(&self.data[offset..])?;
            match u32::checked_add(header.offset, header.size) {
                Some(end) => {
                    if end as usize > self.data.len() {
                        return Err(OutOfBounds);
                    }
                }
                None => {
                    return Err(malformed_error!(
                        "Stream offset and size cause integer overflow - {} + {}",
                        header.offset,
                        header.size
                    ))
                }
            }

            offset += header.entry_size;
            headers.push(header);
        }

        Ok(headers)
    }
}
