use crate::error::{ErrorKind, Result};
use crate::repository::Repository;
use crate::scope;
use lectio_cache::{CacheRegistry, CacheStore, SetOptions};
use lectio_config::SearchConfig;
use lectio_corpus::Passage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::instrument;

/// Ranks a matching item against the query.
///
/// Both arguments arrive already case-normalised when the search is case
/// insensitive, and `text` is known to contain `query`.
pub trait Scorer: Send + Sync {
    fn score(&self, text: &str, query: &str) -> u32;
}

/// `10 × occurrences of the whole query + distinct query words present`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OccurrenceScorer;

impl Scorer for OccurrenceScorer {
    fn score(&self, text: &str, query: &str) -> u32 {
        let occurrences = text.matches(query).count();
        let words: BTreeSet<&str> = query.split_whitespace().collect();
        let found = words.into_iter().filter(|word| text.contains(word)).count();
        u32::try_from(10 * occurrences + found).unwrap_or(u32::MAX)
    }
}

/// Narrows and pages a search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub collection: Option<String>,
    pub unit_ids: Option<Vec<String>>,
    pub case_sensitive: bool,
    /// Falls back to the configured default when absent.
    pub limit: Option<usize>,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    #[serde(flatten)]
    pub passage: Passage,
    pub relevance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub matches: Vec<SearchMatch>,
    /// Matches found before the scan stopped. When `has_more` is set this is
    /// a lower bound.
    pub total: usize,
    pub has_more: bool,
    pub execution_time_ms: u64,
}

/// Substring search over the corpus.
///
/// Items are scanned in corpus order (catalog order, then sections and items
/// ascending). Once `offset + limit` matches are collected the scan only looks
/// for one further match to answer `has_more`; that match is never ranked.
/// The collected matches are then ordered by relevance, keeping corpus order
/// between equal scores. Stopping early keeps searches for common words cheap,
/// at the cost that a highly relevant item late in the corpus can be missed
/// when the page is already full.
#[derive(Clone)]
pub struct SearchEngine {
    repository: Repository,
    responses: CacheStore<SearchResponse>,
    response_ttl: Option<Duration>,
    limits: SearchConfig,
    scorer: Arc<dyn Scorer>,
}

impl SearchEngine {
    pub fn new(repository: Repository, responses: CacheStore<SearchResponse>, limits: SearchConfig) -> Self {
        let response_ttl = responses.config().default_ttl;
        Self {
            repository,
            responses,
            response_ttl,
            limits,
            scorer: Arc::new(OccurrenceScorer),
        }
    }

    pub fn with_scorer(mut self, scorer: impl Scorer + 'static) -> Self {
        self.scorer = Arc::new(scorer);
        self
    }

    pub fn register_caches(&self, registry: &mut CacheRegistry) {
        registry.register(&self.responses);
    }

    fn check(&self, query: &str, options: &SearchOptions) -> Result<usize> {
        if query.chars().count() < self.limits.min_query_length {
            exn::bail!(ErrorKind::Validation(format!(
                "query must be at least {} characters",
                self.limits.min_query_length
            )));
        }
        let limit = options.limit.unwrap_or(self.limits.default_limit);
        if !(1..=self.limits.max_limit).contains(&limit) {
            exn::bail!(ErrorKind::Validation(format!("limit must be between 1 and {}", self.limits.max_limit)));
        }
        Ok(limit)
    }

    #[instrument(skip(self, options), fields(offset = options.offset))]
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResponse> {
        let query = query.trim();
        let limit = self.check(query, options)?;
        let units = scope::resolve(self.repository.catalog(), options.collection.as_deref(), options.unit_ids.as_deref())?;

        let started = Instant::now();
        let resolved = SearchOptions { limit: Some(limit), ..options.clone() };
        let key = format!("{query}|{}", serde_json::to_string(&resolved).unwrap_or_default());
        if let Some(hit) = self.responses.get(&key).await {
            let mut response = SearchResponse::clone(&hit);
            response.execution_time_ms = elapsed_ms(started);
            return Ok(response);
        }

        let needle = if options.case_sensitive { query.to_string() } else { query.to_lowercase() };
        let wanted = options.offset + limit;
        let mut found = Vec::new();
        let mut has_more = false;
        'scan: for meta in units {
            let unit = match self.repository.get_unit(&meta.id).await {
                Ok(unit) => unit,
                Err(err) => {
                    tracing::warn!(unit = %meta.id, error = ?err, "Skipping unit that failed to load");
                    continue;
                },
            };
            for (&section, items) in &unit.sections {
                for (&item, text) in items {
                    let haystack = if options.case_sensitive { text.clone() } else { text.to_lowercase() };
                    if !haystack.contains(&needle) {
                        continue;
                    }
                    if found.len() == wanted {
                        has_more = true;
                        break 'scan;
                    }
                    found.push(SearchMatch {
                        passage: Passage::new(meta, section, item, text.clone()),
                        relevance: self.scorer.score(&haystack, &needle),
                    });
                }
            }
        }

        // Stable: equal relevance keeps corpus order.
        found.sort_by(|a, b| b.relevance.cmp(&a.relevance));
        let total = found.len();
        let matches = found.into_iter().skip(options.offset).collect();
        let response = SearchResponse { matches, total, has_more, execution_time_ms: elapsed_ms(started) };
        tracing::debug!(limit, total, has_more, "Search complete");

        let cache_options = SetOptions { ttl: self.response_ttl, compress: None };
        if let Err(err) = self.responses.set(&key, response.clone(), cache_options).await {
            tracing::warn!(error = ?err, "Could not cache search response");
        }
        Ok(response)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::tests::fixture;
    use lectio_cache::CacheConfig;
    use lectio_storage::backend::MockBackend;
    use rstest::rstest;

    fn engine() -> (Arc<MockBackend>, SearchEngine) {
        let (backend, repository) = fixture();
        let config = CacheConfig { default_ttl: Some(Duration::from_secs(300)), ..CacheConfig::default() };
        let responses = CacheStore::new("search", config);
        (backend, SearchEngine::new(repository, responses, SearchConfig::default()))
    }

    fn references(response: &SearchResponse) -> Vec<String> {
        response.matches.iter().map(|m| m.passage.reference()).collect()
    }

    #[test]
    fn test_occurrence_scorer_counts() {
        let scorer = OccurrenceScorer;
        // Two occurrences of the phrase, both words present.
        assert_eq!(scorer.score("the world, the world", "the world"), 22);
        // One occurrence, repeated query words only count once.
        assert_eq!(scorer.score("god god so loved", "god god"), 11);
    }

    #[tokio::test]
    async fn test_search_orders_by_relevance_then_corpus_order() {
        let (_, engine) = engine();
        let response = engine.search("world", &SearchOptions::default()).await.unwrap();
        // John 3:17 mentions the world twice.
        assert_eq!(references(&response), vec!["John 3:17", "John 3:16"]);
        assert_eq!(response.matches[0].relevance, 21);
        assert_eq!(response.total, 2);
        assert!(!response.has_more);
    }

    #[tokio::test]
    async fn test_equal_relevance_keeps_corpus_order() {
        let (_, engine) = engine();
        let response = engine.search("beginning", &SearchOptions::default()).await.unwrap();
        assert_eq!(references(&response), vec!["Genesis 1:1", "John 1:1"]);
    }

    #[tokio::test]
    async fn test_early_exit_ranks_only_collected_matches() {
        let (backend, engine) = engine();
        let options = SearchOptions { limit: Some(1), ..SearchOptions::default() };
        let response = engine.search("and", &options).await.unwrap();
        // Genesis 1:2 scores higher but is only seen while checking for more.
        assert_eq!(references(&response), vec!["Genesis 1:1"]);
        assert_eq!(response.total, 1);
        assert!(response.has_more);
        assert_eq!(backend.read_count("john.json").await, 0);
    }

    #[tokio::test]
    async fn test_has_more_is_false_when_scan_completes() {
        let (_, engine) = engine();
        let options = SearchOptions { limit: Some(2), ..SearchOptions::default() };
        let response = engine.search("world", &options).await.unwrap();
        assert_eq!(response.total, 2);
        assert!(!response.has_more);
    }

    #[tokio::test]
    async fn test_case_sensitivity() {
        let (_, engine) = engine();
        let insensitive = engine.search("LIGHT", &SearchOptions::default()).await.unwrap();
        assert_eq!(insensitive.total, 2);
        let options = SearchOptions { case_sensitive: true, ..SearchOptions::default() };
        let sensitive = engine.search("LIGHT", &options).await.unwrap();
        assert!(sensitive.matches.is_empty());
    }

    #[tokio::test]
    async fn test_limit_and_has_more() {
        let (_, engine) = engine();
        let options = SearchOptions { limit: Some(2), ..SearchOptions::default() };
        let response = engine.search("and", &options).await.unwrap();
        assert_eq!(response.matches.len(), 2);
        assert!(response.has_more);
        assert!(response.matches.windows(2).all(|pair| pair[0].relevance >= pair[1].relevance));

        let options = SearchOptions { limit: Some(2), offset: 1, ..SearchOptions::default() };
        let page = engine.search("and", &options).await.unwrap();
        assert!(page.matches.len() <= 2);
    }

    #[tokio::test]
    async fn test_scope_by_collection_and_units() {
        let (_, engine) = engine();
        let options = SearchOptions { collection: Some("New Testament".into()), ..SearchOptions::default() };
        let response = engine.search("beginning", &options).await.unwrap();
        assert_eq!(references(&response), vec!["John 1:1"]);

        let options = SearchOptions { unit_ids: Some(vec!["genesis".into()]), ..SearchOptions::default() };
        let response = engine.search("beginning", &options).await.unwrap();
        assert_eq!(references(&response), vec!["Genesis 1:1"]);
    }

    #[rstest]
    #[case::too_short("a", None)]
    #[case::blank_after_trim("  a  ", None)]
    #[case::zero_limit("grace", Some(0))]
    #[case::limit_above_max("grace", Some(101))]
    #[tokio::test]
    async fn test_rejects_invalid_requests(#[case] query: &str, #[case] limit: Option<usize>) {
        let (_, engine) = engine();
        let options = SearchOptions { limit, ..SearchOptions::default() };
        let err = engine.search(query, &options).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_scope_is_not_found() {
        let (_, engine) = engine();
        let options = SearchOptions { unit_ids: Some(vec!["exodus".into()]), ..SearchOptions::default() };
        let err = engine.search("light", &options).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_unit_is_skipped() {
        let (backend, engine) = engine();
        backend.insert("genesis.json", "not json").await;
        let response = engine.search("beginning", &SearchOptions::default()).await.unwrap();
        assert_eq!(references(&response), vec!["John 1:1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_responses_are_cached() {
        let (backend, engine) = engine();
        // One retried read makes the first scan take measurable time.
        backend.fail_next_reads("genesis.json", 1).await;
        let first = engine.search("light", &SearchOptions::default()).await.unwrap();
        assert!(first.execution_time_ms >= 1);
        // Surrounding whitespace does not change the cache key.
        let second = engine.search(" light ", &SearchOptions::default()).await.unwrap();
        assert_eq!(first.matches, second.matches);
        assert_eq!(second.execution_time_ms, 0);
        assert_eq!(engine.responses.stats().await.hits, 1);
        // The failed read and its retry; the cached response reads nothing.
        assert_eq!(backend.read_count("genesis.json").await, 2);

        let options = SearchOptions { case_sensitive: true, ..SearchOptions::default() };
        engine.search("light", &options).await.unwrap();
        assert_eq!(engine.responses.stats().await.item_count, 2);
    }
}
