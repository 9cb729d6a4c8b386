//! Bounds-checked little-endian reading and writing over byte buffers.
//!
//! CLI metadata is little-endian throughout, so this module only implements
//! the little-endian half of the usual pair. All operations validate the
//! remaining buffer length before touching memory, which is what keeps
//! truncated input a typed error instead of a panic.
//!
//! The dynamic variants ([`read_le_at_dyn`], [`write_le_at_dyn`]) handle the
//! 2-or-4-byte index fields whose width is decided by the table layout
//! resolver rather than by the field's logical type.

use crate::{Error::OutOfBounds, Result};

/// Trait for primitive types that can be moved through a metadata image.
///
/// Implemented for the fixed-width integers that appear as table columns and
/// header fields.
pub trait CilIO: Sized {
    /// The byte-array representation of this type
    type Bytes: for<'a> TryFrom<&'a [u8]> + AsRef<[u8]>;

    /// Convert from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
    /// Convert into little-endian bytes
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_cil_io {
    ($($ty:ty),+) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )+
    };
}

impl_cil_io!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Safely reads a value of type `T` in little-endian byte order from the start
/// of a data buffer.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer holds fewer bytes than
/// the type requires.
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`,
/// advancing the offset by the number of bytes consumed.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if insufficient bytes remain.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    if (type_len + *offset) > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..*offset + type_len].try_into() else {
        return Err(OutOfBounds);
    };

    *offset += type_len;

    Ok(T::from_le_bytes(read))
}

/// Dynamically reads either a 2-byte or 4-byte little-endian value.
///
/// Reads a `u32` if `is_large` is set, otherwise reads a `u16` and promotes it.
/// Table and heap index columns use this, with `is_large` supplied by the
/// resolved [`crate::metadata::tables::TableInfo`].
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if insufficient bytes remain.
pub fn read_le_at_dyn(data: &[u8], offset: &mut usize, is_large: bool) -> Result<u32> {
    let res = if is_large {
        read_le_at::<u32>(data, offset)?
    } else {
        u32::from(read_le_at::<u16>(data, offset)?)
    };

    Ok(res)
}

/// Safely writes a value of type `T` in little-endian byte order to the start
/// of a buffer.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is too small.
pub fn write_le<T: CilIO>(data: &mut [u8], value: T) -> Result<()> {
    let mut offset = 0_usize;
    write_le_at(data, &mut offset, value)
}

/// Safely writes a value of type `T` in little-endian byte order at `offset`,
/// advancing the offset by the number of bytes written.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if insufficient space remains.
pub fn write_le_at<T: CilIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let bytes = value.to_le_bytes();
    let type_len = bytes.as_ref().len();
    if (type_len + *offset) > data.len() {
        return Err(OutOfBounds);
    }

    data[*offset..*offset + type_len].copy_from_slice(bytes.as_ref());
    *offset += type_len;

    Ok(())
}

/// Dynamically writes either a 2-byte or 4-byte little-endian value.
///
/// The symmetric counterpart of [`read_le_at_dyn`]. When `is_large` is false
/// the value must fit in 16 bits; a wider value indicates the caller sized the
/// column against a stale layout.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] on insufficient space, or a malformed
/// error if a small column receives a value above `u16::MAX`.
pub fn write_le_at_dyn(
    data: &mut [u8],
    offset: &mut usize,
    value: u32,
    is_large: bool,
) -> Result<()> {
    if is_large {
        write_le_at::<u32>(data, offset, value)
    } else {
        let Ok(small) = u16::try_from(value) else {
            return Err(malformed_error!(
                "Value does not fit 2-byte index column - {}",
                value
            ));
        };
        write_le_at::<u16>(data, offset, small)
    }
}
