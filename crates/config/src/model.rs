use crate::error::{ErrorKind, Result};
use lectio_cache::{CacheConfig, Strategy};
use lectio_compress::Compression;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub cache: CachesConfig,
    pub loader: LoaderConfig,
    pub search: SearchConfig,
    pub sampler: SamplerConfig,
}

impl Config {
    /// Check that every value is usable.
    ///
    /// Called by [`Config::load`](crate::Config::load); only needs calling
    /// directly for configuration built in code.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| -> Result<()> { exn::bail!(ErrorKind::Invalid(message)) };
        if self.corpus.catalog.as_os_str().is_empty() {
            return invalid("corpus.catalog must not be empty".to_string());
        }
        if let SourceConfig::Http { base_url } = &self.corpus.source
            && !(base_url.starts_with("http://") || base_url.starts_with("https://"))
        {
            return invalid(format!("corpus.source.base_url must be an http(s) URL, found {base_url:?}"));
        }
        if self.corpus.translation.identifier.trim().is_empty() {
            return invalid("corpus.translation.identifier must not be empty".to_string());
        }
        for (name, settings) in [("units", &self.cache.units), ("sections", &self.cache.sections), ("search", &self.cache.search)] {
            if settings.max_size == 0 {
                return invalid(format!("cache.{name}.max_size must be at least 1"));
            }
            if settings.ttl == Some(0) {
                return invalid(format!("cache.{name}.ttl must be at least 1 second (omit it to disable expiry)"));
            }
        }
        if self.loader.max_attempts == 0 {
            return invalid("loader.max_attempts must be at least 1".to_string());
        }
        if self.search.max_limit == 0 || !(1..=self.search.max_limit).contains(&self.search.default_limit) {
            return invalid(format!(
                "search.default_limit ({}) must be between 1 and search.max_limit ({})",
                self.search.default_limit, self.search.max_limit
            ));
        }
        if self.search.min_query_length == 0 {
            return invalid("search.min_query_length must be at least 1".to_string());
        }
        if !(1..=SamplerConfig::MAX_COUNT).contains(&self.sampler.max_count) {
            return invalid(format!("sampler.max_count must be between 1 and {}", SamplerConfig::MAX_COUNT));
        }
        if self.sampler.attempts_per_item == 0 {
            return invalid("sampler.attempts_per_item must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Where the corpus lives and how to describe it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Catalog file, relative to the source root.
    pub catalog: PathBuf,
    pub source: SourceConfig,
    /// Check that every unit file in the catalog exists when opening.
    pub verify: bool,
    pub translation: Translation,
}
impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("catalog.json"),
            source: SourceConfig::default(),
            verify: false,
            translation: Translation::default(),
        }
    }
}

/// Storage backend serving the corpus files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// A local directory. Relative paths are resolved against the working
    /// directory.
    Local { root: PathBuf },
    /// A static HTTP(S) server.
    Http { base_url: String },
}
impl Default for SourceConfig {
    fn default() -> Self {
        Self::Local { root: PathBuf::from("corpus") }
    }
}

/// Describes the corpus in API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Translation {
    pub identifier: String,
    pub name: String,
    pub language: String,
    pub language_code: String,
    pub license: String,
}
impl Default for Translation {
    fn default() -> Self {
        Self {
            identifier: "kjv".to_string(),
            name: "King James Version".to_string(),
            language: "English".to_string(),
            language_code: "en".to_string(),
            license: "Public Domain".to_string(),
        }
    }
}

/// One cache store's settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub max_size: usize,
    /// Default time-to-live in seconds; `None` disables expiry.
    pub ttl: Option<u64>,
    pub strategy: Strategy,
    pub compress: bool,
    pub compression: Compression,
}
impl CacheSettings {
    fn new(max_size: usize, ttl: u64) -> Self {
        Self {
            max_size,
            ttl: Some(ttl),
            strategy: Strategy::default(),
            compress: false,
            compression: Compression::Gzip,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl.map(Duration::from_secs)
    }

    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_size: self.max_size,
            default_ttl: self.ttl(),
            strategy: self.strategy,
            compress: self.compress,
            compression: self.compression,
        }
    }
}
impl Default for CacheSettings {
    fn default() -> Self {
        Self::new(1000, 60 * 60)
    }
}

/// Settings for the three stores the library uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachesConfig {
    /// Whole units, keyed by unit id.
    pub units: CacheSettings,
    /// Single sections, keyed by `unit:section`.
    pub sections: CacheSettings,
    /// Search responses.
    pub search: CacheSettings,
}
impl Default for CachesConfig {
    fn default() -> Self {
        Self {
            units: CacheSettings::new(100, 60 * 60),
            sections: CacheSettings::new(500, 60 * 60),
            search: CacheSettings::new(200, 5 * 60),
        }
    }
}

/// Retry behaviour when reading unit files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Total attempts per read, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each retry after that.
    pub base_delay_ms: u64,
}
impl LoaderConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}
impl Default for LoaderConfig {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay_ms: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub max_limit: usize,
    /// Shortest accepted query, in characters, after trimming.
    pub min_query_length: usize,
}
impl Default for SearchConfig {
    fn default() -> Self {
        Self { default_limit: 50, max_limit: 100, min_query_length: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Most items a single request may ask for.
    pub max_count: usize,
    /// Draws allowed per requested item before giving up.
    pub attempts_per_item: usize,
}
impl SamplerConfig {
    /// Hard ceiling for `max_count`; a single draw never returns more items.
    pub const MAX_COUNT: usize = 10;
}
impl Default for SamplerConfig {
    fn default() -> Self {
        Self { max_count: Self::MAX_COUNT, attempts_per_item: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[rstest]
    #[case::zero_cache_size(|c: &mut Config| c.cache.sections.max_size = 0)]
    #[case::zero_ttl(|c: &mut Config| c.cache.search.ttl = Some(0))]
    #[case::zero_attempts(|c: &mut Config| c.loader.max_attempts = 0)]
    #[case::default_limit_above_max(|c: &mut Config| c.search.default_limit = 101)]
    #[case::zero_default_limit(|c: &mut Config| c.search.default_limit = 0)]
    #[case::zero_query_length(|c: &mut Config| c.search.min_query_length = 0)]
    #[case::empty_catalog(|c: &mut Config| c.corpus.catalog = PathBuf::new())]
    #[case::bad_url(|c: &mut Config| c.corpus.source = SourceConfig::Http { base_url: "ftp://x".into() })]
    #[case::zero_sample(|c: &mut Config| c.sampler.max_count = 0)]
    #[case::sample_above_ceiling(|c: &mut Config| c.sampler.max_count = 11)]
    #[case::zero_sample_attempts(|c: &mut Config| c.sampler.attempts_per_item = 0)]
    fn test_validate_rejects(#[case] change: fn(&mut Config)) {
        let mut config = Config::default();
        change(&mut config);
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_cache_settings_convert() {
        let settings = CacheSettings { ttl: None, strategy: Strategy::Lru, ..CacheSettings::default() };
        let config = settings.to_cache_config();
        assert_eq!(config.default_ttl, None);
        assert_eq!(config.strategy, Strategy::Lru);
        assert_eq!(config.max_size, 1000);
    }
}
