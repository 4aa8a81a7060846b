use crate::Config;
use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "LECTIO_";

/// `config.toml` in the platform configuration directory, if the platform has one.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "lectio").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn file_provider(figment: Figment, path: &Path) -> Figment {
    match path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => figment.merge(Toml::file_exact(path)),
    }
}

impl Config {
    /// The layered figment: defaults, then the file, then the environment.
    ///
    /// A missing file at the default location is skipped; pass an explicit
    /// path to [`Config::load`] to require one.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path.map(Path::to_path_buf).or_else(default_path)
            && path.is_file()
        {
            figment = file_provider(figment, &path);
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate configuration.
    #[instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path
            && !path.is_file()
        {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        let config: Config = Self::figment(path).extract().or_raise(|| ErrorKind::Parse)?;
        config.validate()?;
        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceConfig;
    use figment::Jail;
    use lectio_cache::Strategy;

    #[test]
    fn test_file_then_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "lectio.toml",
                r#"
                    [corpus]
                    catalog = "books.json"
                    source = { kind = "http", base_url = "https://cdn.example.org/kjv" }

                    [cache.units]
                    max_size = 20
                    strategy = "lru"

                    [search]
                    default_limit = 10
                "#,
            )?;
            jail.set_env("LECTIO_SEARCH__DEFAULT_LIMIT", "25");
            jail.set_env("LECTIO_CACHE__SEARCH__COMPRESS", "true");

            let config = Config::load(Some(Path::new("lectio.toml"))).expect("config loads");
            assert_eq!(config.corpus.catalog, PathBuf::from("books.json"));
            assert_eq!(config.corpus.source, SourceConfig::Http { base_url: "https://cdn.example.org/kjv".into() });
            assert_eq!(config.cache.units.max_size, 20);
            assert_eq!(config.cache.units.strategy, Strategy::Lru);
            // Untouched keys keep their defaults.
            assert_eq!(config.cache.units.ttl, Some(3600));
            assert_eq!(config.search.max_limit, 100);
            // Environment wins over the file.
            assert_eq!(config.search.default_limit, 25);
            assert!(config.cache.search.compress);
            Ok(())
        });
    }

    #[test]
    fn test_yaml_by_extension() {
        Jail::expect_with(|jail| {
            jail.create_file("lectio.yaml", "loader:\n  max_attempts: 5\n  base_delay_ms: 10\n")?;
            let config = Config::load(Some(Path::new("lectio.yaml"))).expect("config loads");
            assert_eq!(config.loader.max_attempts, 5);
            assert_eq!(config.loader.base_delay(), std::time::Duration::from_millis(10));
            Ok(())
        });
    }

    #[test]
    fn test_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_invalid_values_rejected_after_merge() {
        Jail::expect_with(|jail| {
            jail.create_file("lectio.toml", "[search]\nmax_limit = 10\n")?;
            let err = Config::load(Some(Path::new("lectio.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }

    #[test]
    fn test_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[cache.units]\nmax_size = \"lots\"\n").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Parse));
    }
}
