//! Storage backend trait and implementations.
//!
//! A corpus source is read, never written: the trait is a read-only view over
//! wherever the catalog and unit files happen to live.

#[cfg(feature = "http")]
mod http;
mod local;
#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "http")]
pub use self::http::HttpBackend;
pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Unified read-only interface for corpus sources.
///
/// All operations are asynchronous to handle network sources and concurrent
/// access from many requests at once.
///
/// # Path Handling
/// All paths are relative to the source root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations
/// enforce this validation.
///
/// # Errors
/// Implementations report a missing file as
/// [`NotFound`](crate::error::ErrorKind::NotFound) and anything that might
/// succeed on a later attempt as a
/// [retryable](crate::error::ErrorKind::is_retryable) kind. Callers rely on
/// that split to decide between "this unit does not exist" and "try again".
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use lectio_storage::{backend::StorageBackend, error::Result};
///
/// async fn catalog_size(backend: &dyn StorageBackend) -> Result<usize> {
///     let path = Path::new("catalog.json");
///     if backend.exists(path).await? {
///         Ok(backend.read(path).await?.len())
///     } else {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// Check if a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;
}
