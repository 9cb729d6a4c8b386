//! metascope — a lazy, byte-exact reader and writer for CLI (.NET) metadata.
//!
//! The crate parses the physical metadata format of ECMA-335 Partition II:
//! the BSJB root, the five streams (`#~`, `#Strings`, `#US`, `#GUID`,
//! `#Blob`), all 43 table kinds, tokens and coded indexes, and blob
//! signatures. It deliberately stops at the metadata region — PE container
//! parsing, RVA translation and IL decoding are left to other layers.
//!
//! Design points:
//!
//! - **Lazy rows.** Tables are carved but not decoded at parse time; a
//!   positional `get(rid)` decodes exactly one row from the raw bytes. The
//!   first structural touch materializes the table once, and both paths are
//!   bit-identical.
//! - **Byte-exact writing.** Every row type encodes back to the bytes it was
//!   decoded from under the same layout, and [`metadata::tables::TableWriter`]
//!   buffers new rows with permanent tokens across sorted flushes.
//! - **Hostile input.** Every read is bounds-checked; malformed headers fail
//!   construction outright while dangling tokens and rids resolve to `None`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use metascope::{
//!     metadata::{tables::{TableId, TypeDefRaw}, view::Metadata},
//!     Result,
//! };
//!
//! fn list_types(path: &std::path::Path) -> Result<()> {
//!     let metadata = Metadata::from_file(path)?;
//!     let view = metadata.view();
//!
//!     if let (Some(tables), Some(strings)) = (view.tables(), view.strings()) {
//!         if let Some(typedefs) = tables.table::<TypeDefRaw>(TableId::TypeDef) {
//!             for row in typedefs {
//!                 println!("{}", strings.get(row.type_name as usize)?);
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```
#![allow(clippy::module_name_repetitions)]

#[macro_use]
mod error;
#[macro_use]
mod macros;

pub mod file;
pub mod metadata;
pub mod prelude;

pub use error::Error;
pub use file::{parser::Parser, File};
pub use metadata::view::{Metadata, MetadataView};

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;
