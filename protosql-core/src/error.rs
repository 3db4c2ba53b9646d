//! Error types for protosql-core.
//!
//! Only the two user-facing inputs can fail: path expressions and type
//! names. Malformed wire bytes are never an error; the decoder truncates
//! and the accessors report absence through `Option`.

use thiserror::Error;

/// Main error type for protosql-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid path expression
    #[error(transparent)]
    Path(#[from] PathError),

    /// Unknown logical type name
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Errors from parsing a `$.1.2[0]`-style path expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The expression does not begin with the `$` root marker
    #[error("Path not valid, path should start with $")]
    MissingRoot,

    /// A bare `$` where a field step is required
    #[error("Path not valid, path should contain at least one field")]
    EmptyPath,

    /// A step does not begin with `.`
    #[error("Path not valid: expected '.' at byte {0}")]
    ExpectedDot(usize),

    /// A step's field number is missing or not a decimal number
    #[error("Path not valid: expected a field number at byte {0}")]
    InvalidFieldNumber(usize),

    /// An index is missing or not a decimal number
    #[error("Path not valid: expected an index at byte {0}")]
    InvalidIndex(usize),

    /// An index bracket is never closed
    #[error("Path not valid: unterminated index at byte {0}")]
    UnterminatedIndex(usize),
}

/// Error from parsing a logical type name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// The name is not in the supported type table
    #[error("Type not valid: {0}")]
    Unknown(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
