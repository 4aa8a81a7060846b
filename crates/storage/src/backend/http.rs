use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::{Client, StatusCode};
use std::path::Path;
use tracing::instrument;

/// Read-only backend serving a corpus from a static HTTP(S) base URL.
///
/// Relative corpus paths are appended to the base URL with `/` separators,
/// so `nt/john.json` under `https://cdn.example.org/kjv` is fetched from
/// `https://cdn.example.org/kjv/nt/john.json`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    name: String,
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            exn::bail!(ErrorKind::BackendError(format!("base URL must be http(s): {base_url}")));
        }
        let client = Client::builder()
            .user_agent(concat!("lectio/", env!("CARGO_PKG_VERSION")))
            .build()
            .or_raise(|| ErrorKind::BackendError("could not build HTTP client".to_string()))?;
        Ok(Self {
            name: "http".to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url_for(&self, path: &Path) -> String {
        let relative = path
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{relative}", self.base_url)
    }
}

fn map_status(status: StatusCode, path: &Path, url: &str) -> ErrorKind {
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => ErrorKind::NotFound(path.to_path_buf()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::PermissionDenied(path.to_path_buf()),
        status if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
            ErrorKind::Network(format!("{url} responded {status}"))
        },
        status => ErrorKind::BackendError(format!("{url} responded {status}")),
    }
}

fn map_transport(err: &reqwest::Error, url: &str) -> ErrorKind {
    ErrorKind::Network(format!("request to {url} failed: {err}"))
}

#[async_trait]
impl StorageBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(backend = %self.name))]
    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        let url = self.url_for(&path);
        let response = match self.client.head(&url).send().await {
            Ok(response) => response,
            Err(err) => exn::bail!(map_transport(&err, &url)),
        };
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND | StatusCode::GONE => Ok(false),
            status => exn::bail!(map_status(status, &path, &url)),
        }
    }

    #[instrument(skip(self), fields(backend = %self.name))]
    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let url = self.url_for(&path);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => exn::bail!(map_transport(&err, &url)),
        };
        let status = response.status();
        if !status.is_success() {
            exn::bail!(map_status(status, &path, &url));
        }
        match response.bytes().await {
            Ok(body) => {
                tracing::debug!(bytes = body.len(), "Fetched corpus file");
                Ok(body.to_vec())
            },
            Err(err) => exn::bail!(map_transport(&err, &url)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_http_base() {
        assert!(HttpBackend::new("ftp://example.org").is_err());
    }

    #[test]
    fn test_url_for_joins_components() {
        let backend = HttpBackend::new("https://cdn.example.org/kjv/").unwrap();
        assert_eq!(
            backend.url_for(Path::new("nt/john.json")),
            "https://cdn.example.org/kjv/nt/john.json"
        );
    }

    #[test]
    fn test_status_mapping() {
        let path = Path::new("nt/john.json");
        assert!(map_status(StatusCode::NOT_FOUND, path, "u").is_not_found());
        assert!(map_status(StatusCode::BAD_GATEWAY, path, "u").is_retryable());
        assert!(map_status(StatusCode::TOO_MANY_REQUESTS, path, "u").is_retryable());
        assert!(matches!(map_status(StatusCode::FORBIDDEN, path, "u"), ErrorKind::PermissionDenied(_)));
    }
}
