//! The `#Strings` heap: null-terminated UTF-8 identifier strings.

use std::ffi::CStr;

use crate::{Error::OutOfBounds, Result};

/// Read-only view over the `#Strings` heap.
///
/// Identifier strings (type names, member names, namespaces) live here,
/// addressed by byte offset from the columns of the metadata tables. Offset 0
/// is the mandatory empty string.
///
/// # Examples
///
/// ```rust
/// use metascope::metadata::streams::Strings;
/// let data = &[0u8, b'H', b'e', b'l', b'l', b'o', 0u8];
/// let strings = Strings::from(data).unwrap();
/// assert_eq!(strings.get(1).unwrap(), "Hello");
/// ```
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Creates a view over heap bytes.
    ///
    /// # Errors
    /// Returns an error if the heap is empty or does not start with the
    /// mandatory null byte.
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #Strings heap"));
        }

        Ok(Strings { data })
    }

    /// Returns the string starting at `index`, up to its null terminator.
    ///
    /// # Errors
    /// Returns an error if `index` is out of bounds, no terminator follows,
    /// or the bytes are not valid UTF-8.
    pub fn get(&self, index: usize) -> Result<&'a str> {
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        let terminated = CStr::from_bytes_until_nul(&self.data[index..])
            .map_err(|_| malformed_error!("Unterminated string at index - {}", index))?;
        terminated
            .to_str()
            .map_err(|_| malformed_error!("Invalid string at index - {}", index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            0x00,
            b'<', b'M', b'o', b'd', b'u', b'l', b'e', b'>', 0x00,
            b'R', b'u', b'n', 0x00,
            b'S', b'y', b's', b't', b'e', b'm', 0x00,
        ];

        let strings = Strings::from(data).unwrap();

        assert_eq!(strings.get(0).unwrap(), "");
        assert_eq!(strings.get(1).unwrap(), "<Module>");
        assert_eq!(strings.get(10).unwrap(), "Run");
        assert_eq!(strings.get(14).unwrap(), "System");
        // Mid-string offsets yield the suffix
        assert_eq!(strings.get(2).unwrap(), "Module>");
    }

    #[test]
    fn invalid() {
        assert!(Strings::from(&[]).is_err());
        assert!(Strings::from(&[b'A', 0x00]).is_err());

        let strings = Strings::from(&[0x00, b'A', b'B']).unwrap();
        // No terminator after index 1
        assert!(strings.get(1).is_err());
        assert!(strings.get(99).is_err());
    }
}
