use thiserror::Error;

use crate::metadata::token::Token;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, covering all failure modes this library can surface.
///
/// Header-level malformations ([`Error::Malformed`], [`Error::NotSupported`])
/// terminate directory construction and are reported as a single error; per-row
/// and per-token problems are localized and typically surface as `None` from
/// lookup operations rather than through this type.
#[derive(Error, Debug)]
pub enum Error {
    /// The input is damaged and could not be parsed.
    ///
    /// Includes the source location where the malformation was detected, since
    /// crafted and obfuscated images tend to break in creative places.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the input.
    ///
    /// Every read is bounds-checked against the remaining buffer length, so
    /// truncated input surfaces here instead of hanging or overrunning.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The metadata uses a recognized but unimplemented legacy format.
    ///
    /// Currently this covers the pre-v1 `#-` era metadata signature.
    #[error("This metadata format is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// A coded index carried a tag beyond its candidate table list, or a
    /// reference named a table slot that cannot exist in this image.
    #[error("Reference out of range - {0}")]
    OutOfRange(String),

    /// Failed to find the row addressed by a token.
    ///
    /// Only returned by operations that contractually require the row to
    /// exist; plain resolution of a dangling token yields `None` instead.
    #[error("Failed to find metadata row - {0}")]
    TokenNotFound(Token),

    /// Recursion limit reached while decoding a nested signature.
    #[error("Reached the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// A write buffer was used after it had already been flushed.
    #[error("Table write buffer has already been flushed")]
    WriterFlushed,

    /// File I/O error, from the memory-mapped input path.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
