//! The `#GUID` heap: a packed array of 128-bit GUIDs.

use crate::{Error::OutOfBounds, Result};

/// Read-only view over the `#GUID` heap.
///
/// Unlike the other heaps this one is indexed 1-based by GUID position, not
/// by byte offset: index `n` is the `n`-th 16-byte entry. Index 0 means no
/// GUID.
///
/// # Examples
///
/// ```rust
/// use metascope::metadata::streams::Guid;
/// let data = &[0u8; 16];
/// let guids = Guid::from(data).unwrap();
/// assert_eq!(guids.get(1).unwrap(), uguid::Guid::ZERO);
/// ```
pub struct Guid<'a> {
    data: &'a [u8],
}

impl<'a> Guid<'a> {
    /// Creates a view over heap bytes.
    ///
    /// # Errors
    /// Returns an error if the heap cannot hold even one GUID.
    pub fn from(data: &'a [u8]) -> Result<Guid<'a>> {
        if data.len() < 16 {
            return Err(malformed_error!("Data for #GUID heap is too small"));
        }

        Ok(Guid { data })
    }

    /// Returns the GUID at the 1-based `index`.
    ///
    /// # Errors
    /// Returns an error if `index` is 0 or past the last whole entry.
    pub fn get(&self, index: usize) -> Result<uguid::Guid> {
        if index == 0 {
            return Err(OutOfBounds);
        }

        let offset = (index - 1) * 16;
        let Some(end) = offset.checked_add(16) else {
            return Err(OutOfBounds);
        };
        if end > self.data.len() {
            return Err(OutOfBounds);
        }

        let mut buffer = [0u8; 16];
        buffer.copy_from_slice(&self.data[offset..end]);
        Ok(uguid::Guid::from_bytes(buffer))
    }

    /// Iterates all whole entries in heap order.
    pub fn iter(&self) -> impl Iterator<Item = uguid::Guid> + 'a {
        let data = self.data;
        (0..data.len() / 16).map(move |position| {
            let mut buffer = [0u8; 16];
            buffer.copy_from_slice(&data[position * 16..position * 16 + 16]);
            uguid::Guid::from_bytes(buffer)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data: [u8; 48] = [
            /* 1 */ 0x8E, 0x90, 0x37, 0xD4, 0xE6, 0x65, 0x7C, 0x48, 0x97, 0x35, 0x7B, 0xDF, 0xF6, 0x99, 0xBE, 0xA5,
            /* 2 */ 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA,
            /* 3 */ 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];

        let guids = Guid::from(&data).unwrap();

        assert_eq!(
            guids.get(1).unwrap(),
            uguid::guid!("d437908e-65e6-487c-9735-7bdff699bea5")
        );
        assert_eq!(
            guids.get(2).unwrap(),
            uguid::guid!("aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa")
        );
        assert_eq!(guids.get(3).unwrap(), uguid::Guid::ZERO);

        let all: Vec<uguid::Guid> = guids.iter().collect();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2], uguid::Guid::ZERO);
    }

    #[test]
    fn invalid() {
        let data = [0u8; 20];
        let guids = Guid::from(&data).unwrap();

        assert!(guids.get(0).is_err());
        // Entry 2 would need bytes 16..32, the heap ends at 20
        assert!(guids.get(2).is_err());
        assert!(Guid::from(&data[..8]).is_err());
    }
}
