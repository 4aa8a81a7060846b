use crate::store::{CacheStore, SetOptions};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

/// Return the cached value for `key`, or run `loader` and cache its output.
///
/// The loader runs without any cache lock held, and its value is only stored
/// once it has completed successfully. Two callers missing the same key at the
/// same time will both load. A value that fails to be stored is still
/// returned to the caller.
pub async fn cached<T, E, F, Fut>(store: &CacheStore<T>, key: &str, options: SetOptions, loader: F) -> Result<Arc<T>, E>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if let Some(hit) = store.get(key).await {
        return Ok(hit);
    }
    let value = loader().await?;
    if let Err(err) = store.set(key, value.clone(), options).await {
        warn!(cache = store.name(), key, error = ?err, "Could not cache loaded value");
    }
    Ok(Arc::new(value))
}
