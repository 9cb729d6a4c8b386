//! The physical metadata streams.
//!
//! A metadata blob carries up to five streams, each located by a
//! [`StreamHeader`] directory entry after the root:
//!
//! - `#~` — the packed metadata tables ([`TablesHeader`])
//! - `#Strings` — null-terminated UTF-8 identifiers ([`Strings`])
//! - `#US` — length-prefixed UTF-16 string literals ([`UserStrings`])
//! - `#GUID` — a packed array of 128-bit GUIDs ([`Guid`])
//! - `#Blob` — length-prefixed binary entries ([`Blob`])
//!
//! All views borrow from the containing buffer; nothing is copied out of the
//! heaps on access.

mod blob;
mod guid;
mod streamheader;
mod strings;
mod tablesheader;
mod userstrings;

pub use blob::Blob;
pub use guid::Guid;
pub use streamheader::StreamHeader;
pub use strings::Strings;
pub use tablesheader::TablesHeader;
pub use userstrings::{UserStrings, UserStringsIter};
