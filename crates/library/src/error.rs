//! Library Error Types
//!
//! Every failure a caller can see falls into one of four kinds. The kind
//! decides how an outer surface should answer (see
//! [`status_code`](ErrorKind::status_code)); the error tree underneath keeps
//! the precise cause for logging.

use derive_more::{Display, Error};
use exn::ResultExt;
use lectio_corpus::error::ErrorKind as CorpusErrorKind;
use lectio_storage::error::ErrorKind as StorageErrorKind;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// ### Caller Errors
/// - [`ErrorKind::Validation`]: the request itself is wrong; do not retry.
/// - [`ErrorKind::NotFound`]: the request is well-formed but addresses nothing.
///
/// ### Operational Errors
/// - [`ErrorKind::Load`]: reading the corpus failed after retries; a later
///   request may succeed.
/// - [`ErrorKind::Configuration`]: the catalog or configuration is
///   inconsistent; fatal at startup.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("{_0}")]
    Validation(#[error(not(source))] String),
    #[display("{_0} not found")]
    NotFound(#[error(not(source))] String),
    #[display("failed to load {_0}")]
    Load(#[error(not(source))] String),
    #[display("configuration error: {_0}")]
    Configuration(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Load(_))
    }

    /// HTTP-equivalent status code.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Load(_) => 503,
            Self::Configuration(_) => 500,
        }
    }

    /// Message safe to show to a caller. Operational failures are reported
    /// generically; their cause is only logged.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(_) | Self::NotFound(_) => self.to_string(),
            Self::Load(_) => "Content is temporarily unavailable, please try again".to_string(),
            Self::Configuration(_) => "The corpus is misconfigured".to_string(),
        }
    }

    pub(crate) fn from_corpus(kind: &CorpusErrorKind) -> Self {
        match kind {
            CorpusErrorKind::InvalidCatalog(message) => Self::Configuration(message.clone()),
            CorpusErrorKind::UnknownUnit(name) => Self::NotFound(format!("unit {name:?}")),
            CorpusErrorKind::MalformedUnit(_) | CorpusErrorKind::InvalidRange(_) | CorpusErrorKind::InvalidReference(_) => {
                Self::Validation(kind.to_string())
            },
        }
    }

    pub(crate) fn from_storage(kind: &StorageErrorKind, what: impl Into<String>) -> Self {
        match kind {
            StorageErrorKind::NotFound(_) => Self::NotFound(what.into()),
            StorageErrorKind::InvalidPath(_) => Self::Configuration(kind.to_string()),
            _ => Self::Load(what.into()),
        }
    }
}

/// Re-raise a corpus error under the library kind it corresponds to.
pub(crate) trait ClassifyCorpus<T> {
    fn classify(self) -> Result<T>;
}
impl<T> ClassifyCorpus<T> for lectio_corpus::error::Result<T> {
    fn classify(self) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => {
                let kind = ErrorKind::from_corpus(&err);
                Err(err).or_raise(|| kind)
            },
        }
    }
}
