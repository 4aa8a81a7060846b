//! Generic key/value cache store.

use crate::error::{ErrorKind, Result};
use derive_more::Display;
use exn::ResultExt;
use lectio_compress::Compression;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// How a [`CacheStore`] decides which entries to drop.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Evict the least recently used entry once the store is full. Entries
    /// only expire when a TTL is passed explicitly to [`CacheStore::set`].
    #[display("lru")]
    Lru,
    /// Every entry gets an expiry timer; there is no size ceiling.
    #[display("ttl")]
    Ttl,
    /// Least-recently-used eviction plus a per-entry TTL checked on read.
    #[default]
    #[display("hybrid")]
    Hybrid,
}

impl Strategy {
    fn evicts_by_size(self) -> bool {
        !matches!(self, Self::Ttl)
    }

    fn effective_ttl(self, requested: Option<Duration>, default: Option<Duration>) -> Option<Duration> {
        match self {
            Self::Lru => requested,
            Self::Ttl | Self::Hybrid => requested.or(default),
        }
    }
}

/// Construction parameters for a [`CacheStore`].
#[derive(Clone, Debug, PartialEq)]
pub struct CacheConfig {
    /// Item-count ceiling for the size-evicting strategies. Zero means unbounded.
    pub max_size: usize,
    pub default_ttl: Option<Duration>,
    pub strategy: Strategy,
    /// Whether values are packed by default (overridable per `set`).
    pub compress: bool,
    /// Format used for packed values.
    pub compression: Compression,
}
impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            default_ttl: Some(Duration::from_secs(60 * 60)),
            strategy: Strategy::default(),
            compress: false,
            compression: Compression::Gzip,
        }
    }
}

/// Per-call overrides for [`CacheStore::set`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub ttl: Option<Duration>,
    pub compress: Option<bool>,
}
impl SetOptions {
    pub fn ttl(ttl: Duration) -> Self {
        Self { ttl: Some(ttl), compress: None }
    }

    pub fn compressed(mut self, compress: bool) -> Self {
        self.compress = Some(compress);
        self
    }
}

/// Counters describing how a store has been used.
///
/// These are for observability only; nothing in the store reads them back.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Stats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    /// Size-based evictions and TTL expiries combined.
    pub evictions: u64,
    /// Sum of the serialized (or packed) size of every live entry, in bytes.
    pub total_size: usize,
    pub item_count: usize,
    pub hit_rate: f64,
}

/// Bookkeeping for a single entry, as exposed by [`CacheStore::metadata`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryMetadata {
    pub created_at: Instant,
    pub ttl: Option<Duration>,
    pub access_count: u64,
    pub last_accessed_at: Instant,
    pub size_bytes: usize,
    pub compressed: bool,
}

enum Payload<T> {
    Plain(Arc<T>),
    Packed { format: Compression, bytes: Vec<u8> },
}
impl<T: DeserializeOwned> Payload<T> {
    fn decode(&self) -> Option<Arc<T>> {
        match self {
            Self::Plain(value) => Some(Arc::clone(value)),
            Self::Packed { format, bytes } => {
                // Bytes that don't decompress may have been stored unpacked.
                let parsed = match format.decompress(bytes) {
                    Ok(raw) => serde_json::from_slice(&raw),
                    Err(_) => serde_json::from_slice(bytes),
                };
                parsed.ok().map(Arc::new)
            },
        }
    }
}

struct CacheEntry<T> {
    payload: Payload<T>,
    created_at: Instant,
    ttl: Option<Duration>,
    access_count: u64,
    last_accessed_at: Instant,
    size_bytes: usize,
    /// Position in the recency index; bumped on every hit.
    order: u64,
    /// Tick at which this value was stored; expiry timers only remove the
    /// generation they were scheduled for.
    generation: u64,
}
impl<T> CacheEntry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        self.ttl.is_some_and(|ttl| now.duration_since(self.created_at) >= ttl)
    }

    fn metadata(&self) -> EntryMetadata {
        EntryMetadata {
            created_at: self.created_at,
            ttl: self.ttl,
            access_count: self.access_count,
            last_accessed_at: self.last_accessed_at,
            size_bytes: self.size_bytes,
            compressed: matches!(self.payload, Payload::Packed { .. }),
        }
    }
}

enum Lookup<T> {
    Hit(Arc<T>),
    Expired,
    Corrupt,
}

struct State<T> {
    entries: HashMap<String, CacheEntry<T>>,
    /// Access order → key. The first entry is the least recently used.
    recency: BTreeMap<u64, String>,
    clock: u64,
    stats: Stats,
}
impl<T> State<T> {
    fn new() -> Self {
        Self { entries: HashMap::new(), recency: BTreeMap::new(), clock: 0, stats: Stats::default() }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn insert(&mut self, key: String, entry: CacheEntry<T>) {
        self.stats.total_size += entry.size_bytes;
        self.recency.insert(entry.order, key.clone());
        self.entries.insert(key, entry);
        self.stats.item_count = self.entries.len();
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry<T>> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.order);
        self.stats.total_size = self.stats.total_size.saturating_sub(entry.size_bytes);
        self.stats.item_count = self.entries.len();
        Some(entry)
    }

    fn evict_least_recent(&mut self) -> Option<String> {
        let key = self.recency.first_key_value().map(|(_, key)| key.clone())?;
        self.remove(&key);
        self.stats.evictions += 1;
        Some(key)
    }

    fn touch(&mut self, key: &str, now: Instant) {
        let tick = self.tick();
        if let Some(entry) = self.entries.get_mut(key) {
            self.recency.remove(&entry.order);
            entry.order = tick;
            entry.access_count += 1;
            entry.last_accessed_at = now;
            self.recency.insert(tick, key.to_string());
        }
    }

    fn record(&mut self, hit: bool) {
        if hit {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        let total = self.stats.hits + self.stats.misses;
        self.stats.hit_rate = self.stats.hits as f64 / total as f64;
    }
}

struct Inner<T> {
    name: String,
    config: CacheConfig,
    state: RwLock<State<T>>,
}
impl<T> Inner<T> {
    async fn expire(&self, key: &str, generation: u64) {
        let mut state = self.state.write().await;
        if state.entries.get(key).is_some_and(|entry| entry.generation == generation) {
            state.remove(key);
            state.stats.evictions += 1;
            debug!(cache = %self.name, key, "Expiry timer removed entry");
        }
    }
}

/// A named in-memory cache.
///
/// Cloning is cheap and every clone shares the same entries, so one store can
/// be handed to every request. Locks are held only while the map is touched.
///
/// # Examples
///
/// ```
/// use lectio_cache::{CacheConfig, CacheStore, SetOptions};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store: CacheStore<String> = CacheStore::new("sections", CacheConfig::default());
/// store.set("john:3", "For God so loved the world".to_string(), SetOptions::default()).await.unwrap();
/// assert_eq!(store.get("john:3").await.as_deref().map(String::as_str), Some("For God so loved the world"));
/// assert_eq!(store.stats().await.hits, 1);
/// # }
/// ```
pub struct CacheStore<T> {
    inner: Arc<Inner<T>>,
}
impl<T> Clone for CacheStore<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> CacheStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner { name: name.into(), config, state: RwLock::new(State::new()) }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Look up a value.
    ///
    /// An entry past its TTL is removed and reported as a miss, as is a packed
    /// entry that can no longer be decoded.
    #[instrument(level = "trace", skip(self), fields(cache = %self.inner.name))]
    pub async fn get(&self, key: &str) -> Option<Arc<T>> {
        let now = Instant::now();
        let mut state = self.inner.state.write().await;
        let lookup = state.entries.get(key).map(|entry| {
            if entry.is_expired(now) {
                Lookup::Expired
            } else {
                entry.payload.decode().map_or(Lookup::Corrupt, Lookup::Hit)
            }
        });
        match lookup {
            None => {
                state.record(false);
                None
            },
            Some(Lookup::Expired) => {
                state.remove(key);
                state.stats.evictions += 1;
                state.record(false);
                debug!("Entry expired");
                None
            },
            Some(Lookup::Corrupt) => {
                state.remove(key);
                state.record(false);
                warn!(key, "Dropping cache entry that could not be decoded");
                None
            },
            Some(Lookup::Hit(value)) => {
                state.touch(key, now);
                state.record(true);
                Some(value)
            },
        }
    }

    /// Store a value, replacing any previous value under the same key.
    ///
    /// Storing a new key into a full store evicts the least recently used
    /// entry first (except under [`Strategy::Ttl`], which has no ceiling).
    #[instrument(level = "trace", skip(self, value, options), fields(cache = %self.inner.name))]
    pub async fn set(&self, key: &str, value: T, options: SetOptions) -> Result<()> {
        let config = &self.inner.config;
        let serialized = serde_json::to_vec(&value).or_raise(|| ErrorKind::Serialize(key.to_string()))?;
        let pack = options.compress.unwrap_or(config.compress) && config.compression != Compression::None;
        let (payload, size_bytes) = if pack {
            let bytes = config
                .compression
                .compress(&serialized)
                .or_raise(|| ErrorKind::Compression(key.to_string()))?;
            let size = bytes.len();
            (Payload::Packed { format: config.compression, bytes }, size)
        } else {
            (Payload::Plain(Arc::new(value)), serialized.len())
        };
        let ttl = config.strategy.effective_ttl(options.ttl, config.default_ttl);
        let now = Instant::now();

        let generation = {
            let mut state = self.inner.state.write().await;
            let replaced = state.remove(key).is_some();
            if !replaced && config.strategy.evicts_by_size() && config.max_size > 0 {
                while state.entries.len() >= config.max_size {
                    let Some(evicted) = state.evict_least_recent() else {
                        break;
                    };
                    debug!(key = %evicted, "Evicted least recently used entry");
                }
            }
            let tick = state.tick();
            let entry = CacheEntry {
                payload,
                created_at: now,
                ttl,
                access_count: 0,
                last_accessed_at: now,
                size_bytes,
                order: tick,
                generation: tick,
            };
            state.insert(key.to_string(), entry);
            state.stats.sets += 1;
            tick
        };

        if config.strategy == Strategy::Ttl
            && let Some(ttl) = ttl
        {
            self.schedule_expiry(key.to_string(), generation, ttl);
        }
        Ok(())
    }

    fn schedule_expiry(&self, key: String, generation: u64, ttl: Duration) {
        let store: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = store.upgrade() {
                inner.expire(&key, generation).await;
            }
        });
    }

    /// Remove a key, returning whether it was present.
    pub async fn delete(&self, key: &str) -> bool {
        let mut state = self.inner.state.write().await;
        let removed = state.remove(key).is_some();
        if removed {
            state.stats.deletes += 1;
        }
        removed
    }

    /// Whether a live (non-expired) entry exists for `key`.
    ///
    /// Does not count as an access, but does drop an expired entry.
    pub async fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut state = self.inner.state.write().await;
        match state.entries.get(key).map(|entry| entry.is_expired(now)) {
            None => false,
            Some(false) => true,
            Some(true) => {
                state.remove(key);
                state.stats.evictions += 1;
                false
            },
        }
    }

    /// Drop every entry. Usage counters are kept.
    pub async fn clear(&self) {
        let mut state = self.inner.state.write().await;
        let dropped = state.entries.len();
        state.entries.clear();
        state.recency.clear();
        state.stats.total_size = 0;
        state.stats.item_count = 0;
        debug!(cache = %self.inner.name, dropped, "Cleared cache");
    }

    pub async fn stats(&self) -> Stats {
        self.inner.state.read().await.stats.clone()
    }

    pub async fn metadata(&self, key: &str) -> Option<EntryMetadata> {
        self.inner.state.read().await.entries.get(key).map(CacheEntry::metadata)
    }

    pub async fn len(&self) -> usize {
        self.inner.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
