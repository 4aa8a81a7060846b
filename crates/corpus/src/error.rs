//! Corpus Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A corpus error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for corpus operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The catalog is unusable; nothing can be served until it is fixed.
    #[display("invalid catalog: {_0}")]
    InvalidCatalog(#[error(not(source))] String),
    /// A unit file does not have the expected section/item shape.
    #[display("malformed unit data: {_0}")]
    MalformedUnit(#[error(not(source))] String),
    /// No unit in the catalog matches the given id or name.
    #[display("unknown unit: {_0}")]
    UnknownUnit(#[error(not(source))] String),
    /// An item range is empty, reversed, too wide, or starts at zero.
    #[display("invalid item range: {_0}")]
    InvalidRange(#[error(not(source))] String),
    /// A textual reference could not be understood.
    #[display("invalid reference: {_0}")]
    InvalidReference(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Corpus data is static: it is either well-formed or it isn't.
        false
    }
}
