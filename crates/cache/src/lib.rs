//! In-memory cache stores for loaded corpus content.
//!
//! Nothing here is persisted: the corpus source is the only source of truth and
//! every store can be cleared (or the process restarted) without losing data.
//!
//! # Architecture
//! - [`CacheStore`]: a named, generic key/value store. Eviction is governed by
//!   a [`Strategy`]: least-recently-used with a size ceiling, independent
//!   per-entry expiry timers, or both (the default).
//! - [`CacheRegistry`]: the set of named stores a process uses, so each can be
//!   inspected or cleared without knowing its value type.
//! - [`cached`]: look a key up and, on a miss, run a loader and store what it
//!   returns.

mod cached;
pub mod error;
mod registry;
mod store;

pub use crate::cached::cached;
pub use crate::registry::{CacheHandle, CacheRegistry};
pub use crate::store::{CacheConfig, CacheStore, EntryMetadata, SetOptions, Stats, Strategy};
