//! Serving a corpus: loading, caching, searching, looking up and sampling.
//!
//! Layers, from the bottom:
//! - `loader`: reads unit files through a storage backend, with retries.
//! - [`Repository`]: cache-first access to units, sections and items.
//! - [`SearchEngine`] and [`Sampler`]: built on the repository.
//! - [`api::Library`]: the request/response facade outer surfaces use.

pub mod api;
pub mod error;
mod loader;
mod repository;
mod sampler;
mod scope;
mod search;

pub use crate::api::{ApiError, Library};
pub use crate::loader::{CorpusLoader, RetryPolicy};
pub use crate::repository::Repository;
pub use crate::sampler::{Sample, SampleOptions, Sampler};
pub use crate::search::{OccurrenceScorer, Scorer, SearchEngine, SearchMatch, SearchOptions, SearchResponse};
