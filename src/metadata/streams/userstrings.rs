//! The `#US` heap: length-prefixed UTF-16 string literals.

use widestring::U16String;

use crate::{file::parser::Parser, Error::OutOfBounds, Result};

/// Read-only view over the `#US` heap.
///
/// Each entry starts with a compressed length covering the UTF-16 payload
/// plus one terminal byte (a flag marking strings that need special handling,
/// not part of the text). Entries are addressed by byte offset, carried in the
/// low bits of `0x70`-prefixed tokens.
///
/// # Examples
///
/// ```rust
/// use metascope::metadata::streams::UserStrings;
/// let data = &[0u8, 0x05, b'H', 0, b'i', 0, 0x00];
/// let us = UserStrings::from(data).unwrap();
/// assert_eq!(us.get(1).unwrap().to_string_lossy(), "Hi");
/// ```
pub struct UserStrings<'a> {
    data: &'a [u8],
}

impl<'a> UserStrings<'a> {
    /// Creates a view over heap bytes.
    ///
    /// # Errors
    /// Returns an error if the heap is empty or does not start with the
    /// mandatory null byte.
    pub fn from(data: &'a [u8]) -> Result<UserStrings<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #US heap"));
        }

        Ok(UserStrings { data })
    }

    /// Decodes the string entry starting at `index`.
    ///
    /// The payload bytes are not required to be 2-aligned within the stream,
    /// so the UTF-16 units are assembled pairwise rather than viewed in place.
    ///
    /// # Errors
    /// Returns an error if `index` is out of bounds, the length prefix is
    /// malformed, or the payload is truncated or has no room for the terminal
    /// byte.
    pub fn get(&self, index: usize) -> Result<U16String> {
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(&self.data[index..]);
        let len = parser.read_compressed_uint()? as usize;
        if len == 0 {
            return Ok(U16String::new());
        }

        let payload = parser.read_bytes(len)?;
        // Strip the terminal byte; what remains must be whole UTF-16 units
        let (chars, _) = payload.split_at(len - 1);
        if chars.len() % 2 != 0 {
            return Err(malformed_error!(
                "Invalid string data length at index - {}",
                index
            ));
        }

        let units = chars
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect::<Vec<u16>>();
        Ok(U16String::from_vec(units))
    }

    /// Iterates all entries as `(offset, string)` pairs in heap order.
    ///
    /// Iteration stops at the first entry that fails to decode; trailing
    /// alignment garbage in real heaps routinely triggers this.
    #[must_use]
    pub fn iter(&self) -> UserStringsIter<'a> {
        UserStringsIter {
            data: self.data,
            position: 1,
        }
    }
}

/// Iterator over `#US` heap entries.
pub struct UserStringsIter<'a> {
    data: &'a [u8],
    position: usize,
}

impl Iterator for UserStringsIter<'_> {
    type Item = (usize, U16String);

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.data.len() {
            return None;
        }

        let offset = self.position;
        let mut parser = Parser::new(&self.data[offset..]);
        let len = parser.read_compressed_uint().ok()? as usize;

        let heap = UserStrings { data: self.data };
        let value = heap.get(offset).ok()?;

        self.position = offset + parser.pos() + len;
        Some((offset, value))
    }
}

#[cfg(test)]
mod tests {
    use widestring::u16str;

    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            0x00,
            0x1B, // len 27: 13 UTF-16 units + terminal byte
            0x48, 0x00, 0x65, 0x00, 0x6C, 0x00, 0x6C, 0x00, 0x6F, 0x00, 0x2C, 0x00, 0x20, 0x00,
            0x57, 0x00, 0x6F, 0x00, 0x72, 0x00, 0x6C, 0x00, 0x64, 0x00, 0x21, 0x00,
            0x00, // terminal byte
        ];

        let us = UserStrings::from(data).unwrap();
        assert_eq!(us.get(1).unwrap(), u16str!("Hello, World!"));
        // The leading null byte decodes as the empty entry
        assert!(us.get(0).unwrap().is_empty());

        let entries: Vec<(usize, widestring::U16String)> = us.iter().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, 1);
        assert_eq!(entries[0].1, u16str!("Hello, World!"));
    }

    #[test]
    fn invalid() {
        assert!(UserStrings::from(&[]).is_err());
        assert!(UserStrings::from(&[0x22, 0x00]).is_err());

        // Length prefix runs past the heap
        let us = UserStrings::from(&[0x00, 0x10, 0x41, 0x00]).unwrap();
        assert!(us.get(1).is_err());

        // Even length leaves an odd payload after the terminal byte
        let us = UserStrings::from(&[0x00, 0x02, 0x41, 0x00]).unwrap();
        assert!(us.get(1).is_err());

        let us = UserStrings::from(&[0x00, 0x01, 0x00]).unwrap();
        assert!(us.get(99).is_err());
    }
}
