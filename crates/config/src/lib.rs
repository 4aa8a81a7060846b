//! Configuration loading and validation.
//!
//! Values are layered, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. A configuration file: the path given on the command line, or
//!    `config.toml` in the platform's config directory (for example
//!    `~/.config/lectio/config.toml`). TOML, YAML and JSON are accepted,
//!    picked by file extension.
//! 3. Environment variables prefixed with `LECTIO_`, using `__` to reach
//!    nested keys: `LECTIO_CACHE__UNITS__MAX_SIZE=20`.
//!
//! The merged result is validated before it is returned.

pub mod error;
mod load;
mod model;

pub use crate::load::{ENV_PREFIX, default_path};
pub use crate::model::{
    CacheSettings, CachesConfig, Config, CorpusConfig, LoaderConfig, SamplerConfig, SearchConfig, SourceConfig,
    Translation,
};
