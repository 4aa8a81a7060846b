//! Read-only access to a corpus source.
//!
//! The corpus (a catalog file plus one data file per unit) is supplied from
//! outside the process and never written to. A [`StorageBackend`] hides where
//! it lives: a local directory, an HTTP server, or memory in tests.

pub mod backend;
pub mod error;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
