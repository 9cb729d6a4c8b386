//! Stream directory entries of the metadata root.

use crate::{file::io::read_le, Error::OutOfBounds, Result};

/// One entry of the stream directory following the metadata root.
///
/// Names the stream and locates it (offset and size relative to the root).
/// The header itself is variable-length: the name is a null-terminated ASCII
/// string padded to a 4-byte boundary, at most 32 bytes.
pub struct StreamHeader {
    /// Byte offset of the stream, relative to the metadata root
    pub offset: u32,
    /// Size of the stream in bytes
    pub size: u32,
    /// Stream name, e.g. `#~` or `#Strings`
    pub name: String,
    /// Total encoded size of this header entry, including name padding
    pub entry_size: usize,
}

impl StreamHeader {
    /// Parses one directory entry from the start of `data`.
    ///
    /// # Errors
    /// Returns an error if the data is too short, the name is unterminated,
    /// or the name is not one of the five defined streams.
    pub fn from(data: &[u8]) -> Result<StreamHeader> {
        if data.len() < 9 {
            return Err(OutOfBounds);
        }

        let mut name = String::with_capacity(32);
        let mut terminated = false;
        for counter in 0..std::cmp::min(32, data.len() - 8) {
            let name_char = read_le::<u8>(&data[8 + counter..])?;
            if name_char == 0 {
                terminated = true;
                break;
            }

            name.push(char::from(name_char));
        }

        if !terminated {
            return Err(malformed_error!("Unterminated stream header name"));
        }

        if !["#~", "#Strings", "#US", "#GUID", "#Blob"]
            .iter()
            .any(|valid_name| name == *valid_name)
        {
            return Err(malformed_error!("Invalid stream header name - {}", name));
        }

        // Name storage is padded to the next 4-byte boundary, terminator included
        let name_bytes = (name.len() + 1).div_ceil(4) * 4;

        Ok(StreamHeader {
            offset: read_le::<u32>(data)?,
            size: read_le::<u32>(&data[4..])?,
            name,
            entry_size: 8 + name_bytes,
        })
    }
}
