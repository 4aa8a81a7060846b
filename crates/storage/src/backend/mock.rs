//! In-memory storage backend for testing.

use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use async_trait::async_trait;
use exn::OptionExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Default)]
struct MockState {
    files: HashMap<PathBuf, Vec<u8>>,
    /// Remaining number of reads that fail with a transient error, per path.
    failures: HashMap<PathBuf, usize>,
    /// Number of `read()` calls per path, failed ones included.
    reads: HashMap<PathBuf, usize>,
}

/// In-memory storage backend for testing.
///
/// Files live in a `HashMap` behind a [`RwLock`], so all trait methods operate
/// on `&self`. On top of serving files, the mock counts reads per path and can
/// be told to fail the next N reads of a path with a transient network error,
/// which is what retry and cache-hit tests need to observe.
///
/// # Examples
///
/// ```
/// use lectio_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([("nt/john.json", r#"{"1":{"1":"In the beginning was the Word"}}"#)]);
/// backend.fail_next_reads("nt/john.json", 1).await;
/// assert!(backend.read(Path::new("nt/john.json")).await.is_err());
/// assert!(backend.read(Path::new("nt/john.json")).await.is_ok());
/// assert_eq!(backend.read_count("nt/john.json").await, 2);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    state: RwLock<MockState>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = HashMap::new();
        for (path, data) in files {
            map.insert(Self::validated(path.into()), data.into());
        }
        Self {
            name: "mock".to_string(),
            state: RwLock::new(MockState { files: map, ..MockState::default() }),
        }
    }

    fn validated(path: PathBuf) -> PathBuf {
        let Ok(validated) = validate_path(&path) else {
            // The panic here is DELIBERATE. MockBackend is only used in tests.
            panic!("MockBackend: invalid path {}", path.display());
        };
        validated
    }

    /// Add or replace a file.
    pub async fn insert(&self, path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) {
        let path = Self::validated(path.into());
        self.state.write().await.files.insert(path, data.into());
    }

    /// Make the next `count` reads of `path` fail with a retryable error.
    pub async fn fail_next_reads(&self, path: impl Into<PathBuf>, count: usize) {
        let path = Self::validated(path.into());
        self.state.write().await.failures.insert(path, count);
    }

    /// How many times `path` has been read, including failed reads.
    pub async fn read_count(&self, path: impl Into<PathBuf>) -> usize {
        let path = Self::validated(path.into());
        self.state.read().await.reads.get(&path).copied().unwrap_or(0)
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.state.read().await.files.contains_key(&path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let mut state = self.state.write().await;
        *state.reads.entry(path.clone()).or_default() += 1;
        if let Some(remaining) = state.failures.get_mut(&path)
            && *remaining > 0
        {
            *remaining -= 1;
            exn::bail!(ErrorKind::Network(format!("injected failure reading {}", path.display())));
        }
        state.files.get(&path).cloned().ok_or_raise(|| ErrorKind::NotFound(path.clone()))
    }
}
