//! The metadata row model: one fixed-layout value type per table kind.
//!
//! Every row is a flat tuple of columns decoded to natural integer width —
//! the 2-vs-4-byte question is an encoding detail owned by the resolved
//! [`crate::metadata::tables::TableInfo`], not part of a row's logical shape.
//! Rows carry their rid, minted token, and byte offset alongside the columns.
//!
//! The `table_row!` macro generates the struct plus its
//! [`crate::metadata::tables::RowReadable`] and
//! [`crate::metadata::tables::RowWritable`] implementations from a column
//! list. Column kinds:
//!
//! - `u8` / `u16` / `u32` / `u64` — fixed-width constants
//! - `str` / `guid` / `blob` — heap offsets, width from the heap-size flags
//! - `idx(Table)` — simple index into one table, width from its row count
//! - `coded(Form)` — coded index, width from the candidate row counts

mod assembly;
mod members;
mod semantics;
mod types;

pub use assembly::*;
pub use members::*;
pub use semantics::*;
pub use types::*;

/// The Rust type a column kind decodes to.
macro_rules! col_type {
    (u8) => { u8 };
    (u16) => { u16 };
    (u32) => { u32 };
    (u64) => { u64 };
    (str) => { u32 };
    (guid) => { u32 };
    (blob) => { u32 };
    (idx($table:ident)) => { u32 };
    (coded($form:ident)) => { $crate::metadata::tables::CodedIndex };
}

/// The encoded size in bytes of a column under a resolved layout.
macro_rules! col_size {
    (u8, $sizes:expr) => {
        1u32
    };
    (u16, $sizes:expr) => {
        2u32
    };
    (u32, $sizes:expr) => {
        4u32
    };
    (u64, $sizes:expr) => {
        8u32
    };
    (str, $sizes:expr) => {
        u32::from($sizes.str_bytes())
    };
    (guid, $sizes:expr) => {
        u32::from($sizes.guid_bytes())
    };
    (blob, $sizes:expr) => {
        u32::from($sizes.blob_bytes())
    };
    (idx($table:ident), $sizes:expr) => {
        u32::from($sizes.table_index_bytes($crate::metadata::tables::TableId::$table))
    };
    (coded($form:ident), $sizes:expr) => {
        u32::from($sizes.coded_index_bytes($crate::metadata::tables::CodedIndexType::$form))
    };
}

/// Reads one column at the layout-resolved width, advancing the offset.
macro_rules! col_read {
    (u8, $data:expr, $offset:expr, $sizes:expr) => {
        $crate::file::io::read_le_at::<u8>($data, $offset)?
    };
    (u16, $data:expr, $offset:expr, $sizes:expr) => {
        $crate::file::io::read_le_at::<u16>($data, $offset)?
    };
    (u32, $data:expr, $offset:expr, $sizes:expr) => {
        $crate::file::io::read_le_at::<u32>($data, $offset)?
    };
    (u64, $data:expr, $offset:expr, $sizes:expr) => {
        $crate::file::io::read_le_at::<u64>($data, $offset)?
    };
    (str, $data:expr, $offset:expr, $sizes:expr) => {
        $crate::file::io::read_le_at_dyn($data, $offset, $sizes.is_large_str())?
    };
    (guid, $data:expr, $offset:expr, $sizes:expr) => {
        $crate::file::io::read_le_at_dyn($data, $offset, $sizes.is_large_guid())?
    };
    (blob, $data:expr, $offset:expr, $sizes:expr) => {
        $crate::file::io::read_le_at_dyn($data, $offset, $sizes.is_large_blob())?
    };
    (idx($table:ident), $data:expr, $offset:expr, $sizes:expr) => {
        $crate::file::io::read_le_at_dyn(
            $data,
            $offset,
            $sizes.is_large($crate::metadata::tables::TableId::$table),
        )?
    };
    (coded($form:ident), $data:expr, $offset:expr, $sizes:expr) => {
        $crate::metadata::tables::CodedIndex::read(
            $data,
            $offset,
            $sizes,
            $crate::metadata::tables::CodedIndexType::$form,
        )?
    };
}

/// Writes one column at the layout-resolved width, advancing the offset.
macro_rules! col_write {
    (u8, $value:expr, $data:expr, $offset:expr, $sizes:expr) => {
        $crate::file::io::write_le_at::<u8>($data, $offset, $value)?
    };
    (u16, $value:expr, $data:expr, $offset:expr, $sizes:expr) => {
        $crate::file::io::write_le_at::<u16>($data, $offset, $value)?
    };
    (u32, $value:expr, $data:expr, $offset:expr, $sizes:expr) => {
        $crate::file::io::write_le_at::<u32>($data, $offset, $value)?
    };
    (u64, $value:expr, $data:expr, $offset:expr, $sizes:expr) => {
        $crate::file::io::write_le_at::<u64>($data, $offset, $value)?
    };
    (str, $value:expr, $data:expr, $offset:expr, $sizes:expr) => {
        $crate::file::io::write_le_at_dyn($data, $offset, $value, $sizes.is_large_str())?
    };
    (guid, $value:expr, $data:expr, $offset:expr, $sizes:expr) => {
        $crate::file::io::write_le_at_dyn($data, $offset, $value, $sizes.is_large_guid())?
    };
    (blob, $value:expr, $data:expr, $offset:expr, $sizes:expr) => {
        $crate::file::io::write_le_at_dyn($data, $offset, $value, $sizes.is_large_blob())?
    };
    (idx($table:ident), $value:expr, $data:expr, $offset:expr, $sizes:expr) => {
        $crate::file::io::write_le_at_dyn(
            $data,
            $offset,
            $value,
            $sizes.is_large($crate::metadata::tables::TableId::$table),
        )?
    };
    (coded($form:ident), $value:expr, $data:expr, $offset:expr, $sizes:expr) => {
        $value.write(
            $data,
            $offset,
            $sizes,
            $crate::metadata::tables::CodedIndexType::$form,
        )?
    };
}

/// Declares a raw row type with its decode/encode implementations.
macro_rules! table_row {
    (
        $(#[$meta:meta])*
        $name:ident : $table:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident: $kind:tt $(($arg:ident))?
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name {
            /// The 1-based row id
            pub rid: u32,
            /// The token addressing this row
            pub token: $crate::metadata::token::Token,
            /// Byte offset of this row within the raw table region
            pub offset: usize,
            $(
                $(#[$field_meta])*
                pub $field: col_type!($kind $(($arg))?),
            )+
        }

        impl $crate::metadata::tables::RowReadable for $name {
            fn row_size(sizes: &$crate::metadata::tables::TableInfoRef) -> u32 {
                0 $( + col_size!($kind $(($arg))?, sizes) )+
            }

            fn row_read(
                data: &[u8],
                offset: &mut usize,
                rid: u32,
                sizes: &$crate::metadata::tables::TableInfoRef,
            ) -> $crate::Result<Self> {
                Ok($name {
                    rid,
                    token: $crate::metadata::token::Token::from_table(
                        $crate::metadata::tables::TableId::$table,
                        rid,
                    ),
                    offset: *offset,
                    $( $field: col_read!($kind $(($arg))?, data, offset, sizes), )+
                })
            }
        }

        impl $crate::metadata::tables::RowWritable for $name {
            fn row_write(
                &self,
                data: &mut [u8],
                offset: &mut usize,
                _rid: u32,
                sizes: &$crate::metadata::tables::TableInfoRef,
            ) -> $crate::Result<()> {
                $( col_write!($kind $(($arg))?, self.$field, data, offset, sizes); )+
                Ok(())
            }
        }
    };
}

pub(crate) use {col_read, col_size, col_type, col_write, table_row};
