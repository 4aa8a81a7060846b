use crate::error::{ClassifyCorpus, ErrorKind, Result};
use exn::ResultExt;
use lectio_compress::Compression;
use lectio_config::LoaderConfig;
use lectio_corpus::{Catalog, Unit, UnitMeta, validate};
use lectio_storage::BackendHandle;
use std::borrow::Cow;
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

/// How often, and how patiently, transient read failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
}
impl RetryPolicy {
    /// Delay after the `failed`-th failed attempt (counting from zero):
    /// `base_delay * 2^failed`.
    pub fn delay(&self, failed: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(failed))
    }
}
impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&LoaderConfig::default())
    }
}
impl From<&LoaderConfig> for RetryPolicy {
    fn from(config: &LoaderConfig) -> Self {
        Self { max_attempts: config.max_attempts.max(1), base_delay: config.base_delay() }
    }
}

/// Reads unit files from a storage backend and turns them into [`Unit`]s.
///
/// The loader does no caching of its own: every call reads the backend. Files
/// named with a compression extension (`.gz`, `.bz2`, `.zst`) are decompressed
/// first, and every file is validated before it is returned.
#[derive(Clone)]
pub struct CorpusLoader {
    backend: BackendHandle,
    retry: RetryPolicy,
}

impl CorpusLoader {
    pub fn new(backend: BackendHandle, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    /// Load and validate one unit.
    ///
    /// # Errors
    /// - [`NotFound`](ErrorKind::NotFound) if the backend says the file does
    ///   not exist.
    /// - [`Load`](ErrorKind::Load) if reading still fails after retries.
    /// - [`Validation`](ErrorKind::Validation) if the file is not a valid unit.
    #[instrument(skip(self, meta), fields(unit = %meta.id, backend = self.backend.name()))]
    pub async fn load(&self, meta: &UnitMeta) -> Result<Unit> {
        let bytes = self.read(&meta.file, &format!("unit {}", meta.id)).await?;
        let content = decode(&meta.file, &bytes)
            .or_raise(|| ErrorKind::Validation(format!("unit {} could not be decompressed", meta.id)))?;
        let unit = validate::parse_unit(meta.clone(), &content).classify()?;
        tracing::debug!(sections = unit.sections.len(), items = unit.item_count(), "Loaded unit");
        Ok(unit)
    }

    /// Load and validate the catalog.
    ///
    /// Any failure here is a [`Configuration`](ErrorKind::Configuration)
    /// error: without a catalog there is nothing to serve.
    #[instrument(skip(self), fields(backend = self.backend.name()))]
    pub async fn load_catalog(&self, path: &Path) -> Result<Catalog> {
        let what = format!("catalog {}", path.display());
        let bytes = self.read(path, &what).await.or_raise(|| ErrorKind::Configuration(format!("{what} unreadable")))?;
        let content = decode(path, &bytes).or_raise(|| ErrorKind::Configuration(format!("{what} could not be decompressed")))?;
        let catalog = Catalog::from_json(&content).classify()?;
        tracing::info!(units = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    /// Read a file, retrying failures the backend marks as transient.
    async fn read(&self, path: &Path, what: &str) -> Result<Vec<u8>> {
        let mut failed = 0;
        loop {
            match self.backend.read(path).await {
                Ok(bytes) => return Ok(bytes),
                Err(err) if err.is_retryable() && failed + 1 < self.retry.max_attempts => {
                    let delay = self.retry.delay(failed);
                    tracing::warn!(path = %path.display(), attempt = failed + 1, ?delay, error = ?err, "Transient read failure; retrying");
                    failed += 1;
                    tokio::time::sleep(delay).await;
                },
                Err(err) => {
                    let kind = ErrorKind::from_storage(&err, what);
                    if kind.is_retryable() {
                        tracing::error!(path = %path.display(), attempts = failed + 1, error = ?err, "Giving up reading file");
                    }
                    return Err(err).or_raise(|| kind);
                },
            }
        }
    }
}

fn decode<'a>(path: &Path, bytes: &'a [u8]) -> lectio_compress::error::Result<Cow<'a, [u8]>> {
    match Compression::detect(path, bytes) {
        Compression::None => Ok(Cow::Borrowed(bytes)),
        compression => Ok(Cow::Owned(compression.decompress(bytes)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectio_storage::backend::MockBackend;
    use std::sync::Arc;

    const JOHN: &str = r#"{"3": {"16": "For God so loved the world", "17": "For God sent not his Son"}}"#;

    fn meta(file: &str) -> UnitMeta {
        UnitMeta {
            id: "john".into(),
            name: "John".into(),
            collection: "New Testament".into(),
            file: file.into(),
        }
    }

    fn loader(backend: &Arc<MockBackend>) -> CorpusLoader {
        let retry = RetryPolicy { max_attempts: 3, base_delay: Duration::from_millis(100) };
        CorpusLoader::new(backend.clone(), retry)
    }

    #[test]
    fn test_backoff_doubles() {
        let retry = RetryPolicy { max_attempts: 3, base_delay: Duration::from_millis(100) };
        assert_eq!(retry.delay(0), Duration::from_millis(100));
        assert_eq!(retry.delay(1), Duration::from_millis(200));
        assert_eq!(retry.delay(2), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_load() {
        let backend = Arc::new(MockBackend::with_files([("nt/john.json", JOHN)]));
        let unit = loader(&backend).load(&meta("nt/john.json")).await.unwrap();
        assert_eq!(unit.item(3, 16), Some("For God so loved the world"));
        assert_eq!(backend.read_count("nt/john.json").await, 1);
    }

    #[tokio::test]
    async fn test_load_compressed() {
        let packed = Compression::Gzip.compress(JOHN.as_bytes()).unwrap();
        let backend = Arc::new(MockBackend::with_files([("nt/john.json.gz", packed)]));
        let unit = loader(&backend).load(&meta("nt/john.json.gz")).await.unwrap();
        assert_eq!(unit.item(3, 17), Some("For God sent not his Son"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let backend = Arc::new(MockBackend::with_files([("nt/john.json", JOHN)]));
        backend.fail_next_reads("nt/john.json", 2).await;
        let started = tokio::time::Instant::now();
        loader(&backend).load(&meta("nt/john.json")).await.unwrap();
        assert_eq!(backend.read_count("nt/john.json").await, 3);
        // 100ms after the first failure, 200ms after the second.
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let backend = Arc::new(MockBackend::with_files([("nt/john.json", JOHN)]));
        backend.fail_next_reads("nt/john.json", 5).await;
        let err = loader(&backend).load(&meta("nt/john.json")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load(_)));
        assert_eq!(backend.read_count("nt/john.json").await, 3);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found_and_not_retried() {
        let backend = Arc::new(MockBackend::default());
        let err = loader(&backend).load(&meta("nt/john.json")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        assert_eq!(backend.read_count("nt/john.json").await, 1);
    }

    #[tokio::test]
    async fn test_malformed_unit_is_validation_and_not_retried() {
        let backend = Arc::new(MockBackend::with_files([("nt/john.json", r#"{"3": ["not", "a", "map"]}"#)]));
        let err = loader(&backend).load(&meta("nt/john.json")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(_)));
        assert_eq!(backend.read_count("nt/john.json").await, 1);
    }

    #[tokio::test]
    async fn test_load_catalog() {
        let catalog = r#"[{"id": "john", "name": "John", "collection": "New Testament", "file": "nt/john.json"}]"#;
        let backend = Arc::new(MockBackend::with_files([("catalog.json", catalog)]));
        let catalog = loader(&backend).load_catalog(Path::new("catalog.json")).await.unwrap();
        assert_eq!(catalog.get("john").unwrap().name, "John");
    }

    #[tokio::test]
    async fn test_bad_catalog_is_configuration_error() {
        let backend = Arc::new(MockBackend::with_files([("catalog.json", "{}")]));
        let err = loader(&backend).load_catalog(Path::new("catalog.json")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Configuration(_)));

        let err = loader(&backend).load_catalog(Path::new("missing.json")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Configuration(_)));
    }
}
