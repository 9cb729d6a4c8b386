//! The `#Blob` heap: length-prefixed binary entries.

use crate::{file::parser::Parser, Error::OutOfBounds, Result};

/// Read-only view over the `#Blob` heap.
///
/// Signatures, constant values, custom attribute payloads and hashes all live
/// here as entries prefixed with a compressed length, addressed by byte
/// offset from table columns. Offset 0 is the mandatory empty blob.
///
/// # Examples
///
/// ```rust
/// use metascope::metadata::streams::Blob;
/// let data = &[0u8, 0x03, 0x41, 0x42, 0x43];
/// let blob = Blob::from(data).unwrap();
/// assert_eq!(blob.get(1).unwrap(), &[0x41, 0x42, 0x43]);
/// ```
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    /// Creates a view over heap bytes.
    ///
    /// # Errors
    /// Returns an error if the heap is empty or does not start with the
    /// mandatory null byte.
    pub fn from(data: &'a [u8]) -> Result<Blob<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #Blob heap"));
        }

        Ok(Blob { data })
    }

    /// Returns the entry starting at `index` as a borrowed slice.
    ///
    /// # Errors
    /// Returns an error if `index` is out of bounds, the length prefix is
    /// malformed, or the declared length runs past the heap.
    pub fn get(&self, index: usize) -> Result<&'a [u8]> {
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(&self.data[index..]);
        let len = parser.read_compressed_uint()? as usize;
        parser.read_bytes(len)
    }
}
