use crate::store::{CacheStore, Stats};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Type-erased view of a [`CacheStore`], enough to inspect and clear it.
#[async_trait]
pub trait CacheHandle: Send + Sync {
    fn name(&self) -> &str;
    async fn stats(&self) -> Stats;
    async fn clear(&self);
}

#[async_trait]
impl<T> CacheHandle for CacheStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        CacheStore::name(self)
    }

    async fn stats(&self) -> Stats {
        CacheStore::stats(self).await
    }

    async fn clear(&self) {
        CacheStore::clear(self).await
    }
}

/// The named cache stores used by one process.
///
/// Stores are registered by name; registering a second store under the same
/// name replaces the first.
#[derive(Clone, Default)]
pub struct CacheRegistry {
    caches: BTreeMap<String, Arc<dyn CacheHandle>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T>(&mut self, store: &CacheStore<T>)
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.caches.insert(store.name().to_string(), Arc::new(store.clone()));
    }

    /// Statistics for every registered store, keyed by name.
    pub async fn all_stats(&self) -> BTreeMap<String, Stats> {
        let mut all = BTreeMap::new();
        for (name, cache) in &self.caches {
            all.insert(name.clone(), cache.stats().await);
        }
        all
    }

    /// Clear one store. Returns `false` if no store has that name.
    pub async fn clear(&self, name: &str) -> bool {
        let Some(cache) = self.caches.get(name) else {
            return false;
        };
        cache.clear().await;
        info!(cache = name, "Cleared cache");
        true
    }

    pub async fn clear_all(&self) {
        for cache in self.caches.values() {
            cache.clear().await;
        }
        info!(caches = self.caches.len(), "Cleared all caches");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheConfig, SetOptions};

    #[tokio::test]
    async fn test_registry_inspects_and_clears_by_name() {
        let units: CacheStore<Vec<u32>> = CacheStore::new("units", CacheConfig::default());
        let sections: CacheStore<String> = CacheStore::new("sections", CacheConfig::default());
        let mut registry = CacheRegistry::new();
        registry.register(&units);
        registry.register(&sections);

        units.set("genesis", vec![1, 2, 3], SetOptions::default()).await.unwrap();
        sections.set("genesis:1", "text".to_string(), SetOptions::default()).await.unwrap();

        let all = registry.all_stats().await;
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["sections", "units"]);
        assert_eq!(all["units"].item_count, 1);

        assert!(registry.clear("units").await);
        assert!(!registry.clear("search").await);
        assert!(units.is_empty().await);
        assert!(!sections.is_empty().await);

        registry.clear_all().await;
        let all = registry.all_stats().await;
        assert!(all.values().all(|stats| stats.item_count == 0));
    }
}
