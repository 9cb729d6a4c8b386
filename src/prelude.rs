//! Convenience re-exports of the common surface.
//!
//! ```rust
//! use metascope::prelude::*;
//! ```

pub use crate::{
    file::{parser::Parser, File},
    metadata::{
        members::{Member, MemberCache, MemberRc},
        root::Root,
        signatures::{
            ResolvedType, SignatureMethod, SignatureParser, SignatureResolver, TypeSignature,
        },
        streams::{Blob, Guid, StreamHeader, Strings, TablesHeader, UserStrings},
        tables::{
            CodedIndex, CodedIndexType, MetadataTable, RowData, RowReadable, RowWritable,
            SortOrder, TableData, TableId, TableInfo, TableInfoRef, TableWriter,
        },
        token::Token,
        view::{Metadata, MetadataView},
    },
    Error, Result,
};
