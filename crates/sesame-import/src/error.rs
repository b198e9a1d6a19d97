//! Import error types for `sesame-import`.

use thiserror::Error;

/// Categorized error for import extraction operations.
///
/// These errors never escape a `parse_*` entry point: each one is
/// converted into a [`crate::report::Diagnostic`] at the entry boundary
/// and the remaining entries in the batch continue to be processed.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The input's structural signature matches no known export dialect.
    #[error("unrecognized format: {0}")]
    UnrecognizedFormat(String),

    /// A single entry is missing required data (secret, cells, fields).
    #[error("malformed entry: {0}")]
    MalformedEntry(String),

    /// An embedded `otpauth://` URI could not be decoded.
    #[error("invalid otpauth URI: {0}")]
    InvalidUri(String),

    /// A supplied parsing capability (element tree, CSV tokenizer)
    /// failed on fundamentally invalid input.
    #[error("parser capability failure: {0}")]
    Capability(String),
}
