//! Cache Error Types
//!
//! Reading from a cache never fails (a damaged entry is a miss). Only storing a
//! value can, when it has to be serialized or packed first.

use derive_more::{Display, Error};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The value could not be serialized for size accounting or packing.
    #[display("could not serialize value for cache key {_0}")]
    Serialize(#[error(not(source))] String),
    /// The serialized value could not be compressed.
    #[display("could not compress value for cache key {_0}")]
    Compression(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
