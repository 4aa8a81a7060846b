//! The request/response boundary callers use.
//!
//! [`Library`] owns everything a process needs to serve a corpus and is built
//! once, explicitly, from a [`Config`]. Outer surfaces (the CLI, an HTTP
//! layer) hold one and turn failures into an [`ApiError`].

mod types;

pub use self::types::{
    ApiError, MAX_LOOKUP_SELECTORS, RandomVerse, RandomVerseOptions, RandomVerseResponse, ReferenceRequest,
    ReferenceResponse, SearchRequest, SectionResponse,
};
use crate::error::{ClassifyCorpus, ErrorKind, Result};
use crate::loader::{CorpusLoader, RetryPolicy};
use crate::repository::Repository;
use crate::sampler::{Sample, SampleOptions, Sampler};
use crate::search::{SearchEngine, SearchResponse};
use exn::ResultExt;
use futures::future::join_all;
use lectio_cache::{CacheRegistry, CacheStore, Stats};
use lectio_config::{Config, SourceConfig, Translation};
use lectio_corpus::{
    Catalog, ItemSelector, Passage, Section, Unit, UnitMeta, expand_item_ranges, format_reference, parse_reference,
};
use lectio_storage::BackendHandle;
use lectio_storage::backend::LocalBackend;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

pub struct Library {
    repository: Repository,
    search: SearchEngine,
    sampler: Sampler,
    caches: CacheRegistry,
    translation: Translation,
}

impl Library {
    /// Connect to the configured corpus source and load its catalog.
    #[instrument(skip(config))]
    pub async fn open(config: &Config) -> Result<Self> {
        let backend: BackendHandle = match &config.corpus.source {
            SourceConfig::Local { root } => {
                let root = std::path::absolute(root)
                    .or_raise(|| ErrorKind::Configuration(format!("corpus root {} is not a usable path", root.display())))?;
                let backend = LocalBackend::new("local", &root)
                    .or_raise(|| ErrorKind::Configuration(format!("corpus root {} is not a directory", root.display())))?;
                Arc::new(backend)
            },
            #[cfg(feature = "http")]
            SourceConfig::Http { base_url } => {
                let backend = lectio_storage::backend::HttpBackend::new(base_url.clone())
                    .or_raise(|| ErrorKind::Configuration(format!("corpus URL {base_url} is not usable")))?;
                Arc::new(backend)
            },
            #[cfg(not(feature = "http"))]
            SourceConfig::Http { base_url } => {
                exn::bail!(ErrorKind::Configuration(format!(
                    "corpus URL {base_url} needs a build with the `http` feature"
                )));
            },
        };
        Self::from_backend(backend, config).await
    }

    /// Build a library over an already constructed backend.
    #[instrument(skip_all, fields(backend = backend.name()))]
    pub async fn from_backend(backend: BackendHandle, config: &Config) -> Result<Self> {
        let loader = CorpusLoader::new(backend, RetryPolicy::from(&config.loader));
        let catalog = loader.load_catalog(&config.corpus.catalog).await?;
        if config.corpus.verify {
            verify(&loader, &catalog).await?;
        }

        let caches = &config.cache;
        let repository = Repository::new(
            Arc::new(catalog),
            loader,
            CacheStore::new("units", caches.units.to_cache_config()),
            CacheStore::new("sections", caches.sections.to_cache_config()),
        );
        let search = SearchEngine::new(
            repository.clone(),
            CacheStore::new("search", caches.search.to_cache_config()),
            config.search.clone(),
        );
        let sampler = Sampler::new(repository.clone(), config.sampler.clone());

        let mut registry = CacheRegistry::new();
        repository.register_caches(&mut registry);
        search.register_caches(&mut registry);

        tracing::info!(
            units = repository.catalog().len(),
            collections = repository.catalog().collections().len(),
            "Library ready"
        );
        Ok(Self {
            repository,
            search,
            sampler,
            caches: registry,
            translation: config.corpus.translation.clone(),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        self.repository.catalog()
    }

    pub async fn unit(&self, unit_id: &str) -> Result<Arc<Unit>> {
        self.repository.get_unit(unit_id).await
    }

    pub async fn section(&self, unit_id: &str, section: u32) -> Result<SectionResponse> {
        let items = self.repository.get_section(unit_id, section).await?;
        let meta = self.repository.meta(unit_id)?;
        Ok(SectionResponse {
            reference: format_reference(&meta.name, section, &[]),
            unit_id: meta.id.clone(),
            unit_name: meta.name.clone(),
            collection: meta.collection.clone(),
            section,
            items: Section::clone(&items),
        })
    }

    pub async fn item(&self, unit_id: &str, section: u32, item: u32) -> Result<Passage> {
        self.repository.get_passage(unit_id, section, item).await
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        self.search.search(&request.q, &request.options()).await
    }

    /// Fetch the items a structured reference names.
    ///
    /// Items that don't exist are left out; the lookup only fails when none
    /// of the requested items exist.
    #[instrument(skip(self))]
    pub async fn lookup(&self, request: &ReferenceRequest) -> Result<ReferenceResponse> {
        if request.verses.len() > MAX_LOOKUP_SELECTORS {
            exn::bail!(ErrorKind::Validation(format!(
                "at most {MAX_LOOKUP_SELECTORS} verses or ranges may be requested"
            )));
        }
        let meta = self.catalog().resolve_unit_name(&request.book).classify()?;
        self.lookup_in(meta, request.chapter, &request.verses).await
    }

    /// [`lookup`](Self::lookup) from free text such as `"John 3:16-18"`.
    pub async fn lookup_text(&self, reference: &str) -> Result<ReferenceResponse> {
        let parsed = parse_reference(reference, self.catalog()).classify()?;
        // Already resolved to an id; resolving it again as a name could pick another unit.
        let meta = self.repository.meta(&parsed.unit_id)?;
        self.lookup_in(meta, parsed.section, &parsed.items).await
    }

    async fn lookup_in(&self, meta: &UnitMeta, chapter: u32, selectors: &[ItemSelector]) -> Result<ReferenceResponse> {
        let requested = expand_item_ranges(selectors).classify()?;
        let section = self.repository.get_section(&meta.id, chapter).await?;

        let wanted: Vec<u32> = if requested.is_empty() { section.keys().copied().collect() } else { requested };
        let verses: Vec<Passage> = wanted
            .iter()
            .filter_map(|item| section.get(item).map(|text| Passage::new(meta, chapter, *item, text.clone())))
            .collect();
        if verses.is_empty() {
            let reference = format_reference(&meta.name, chapter, &wanted);
            exn::bail!(ErrorKind::NotFound(reference));
        }

        let found: Vec<u32> = verses.iter().map(|passage| passage.item).collect();
        let text = verses.iter().map(|passage| passage.text.as_str()).collect::<Vec<_>>().join(" ");
        Ok(ReferenceResponse {
            reference: format_reference(&meta.name, chapter, &found),
            found_count: verses.len(),
            requested_count: wanted.len(),
            verses,
            text,
        })
    }

    pub async fn random(&self, count: usize, options: &SampleOptions) -> Result<Sample> {
        self.sampler.sample(count, options).await
    }

    pub async fn random_verse(&self, options: &RandomVerseOptions) -> Result<RandomVerseResponse> {
        let sample = self.sampler.sample(1, options).await?;
        match sample.items.into_iter().next() {
            Some(passage) => Ok(RandomVerseResponse { translation: self.translation.clone(), random_verse: passage.into() }),
            None => exn::bail!(ErrorKind::NotFound("a verse in the requested scope".to_string())),
        }
    }

    pub async fn cache_stats(&self) -> BTreeMap<String, Stats> {
        self.caches.all_stats().await
    }

    /// Clear one named cache, or every cache when `name` is `None`.
    pub async fn clear_caches(&self, name: Option<&str>) -> Result<()> {
        match name {
            None => self.caches.clear_all().await,
            Some(name) => {
                if !self.caches.clear(name).await {
                    exn::bail!(ErrorKind::NotFound(format!("cache {name:?}")));
                }
            },
        }
        Ok(())
    }

    /// Preload units; see [`Repository::warm`].
    pub async fn warm(&self, unit_ids: Option<&[String]>) -> Result<usize> {
        if let Some(ids) = unit_ids
            && let Some(unknown) = ids.iter().find(|id| !self.catalog().contains(id))
        {
            exn::bail!(ErrorKind::NotFound(format!("unit {unknown:?}")));
        }
        Ok(self.repository.warm(unit_ids).await)
    }
}

/// Every unit file in the catalog must exist.
async fn verify(loader: &CorpusLoader, catalog: &Catalog) -> Result<()> {
    let backend = loader.backend();
    let checks = join_all(catalog.units().iter().map(|meta| backend.exists(&meta.file))).await;
    let mut missing = Vec::new();
    for (meta, check) in catalog.units().iter().zip(checks) {
        match check {
            Ok(true) => {},
            Ok(false) => missing.push(meta.id.as_str()),
            Err(err) => {
                return Err(err).or_raise(|| ErrorKind::Configuration(format!("could not check unit {}", meta.id)));
            },
        }
    }
    if !missing.is_empty() {
        exn::bail!(ErrorKind::Configuration(format!("unit files missing for {}", missing.join(", "))));
    }
    tracing::debug!(units = catalog.len(), "Verified unit files");
    Ok(())
}
