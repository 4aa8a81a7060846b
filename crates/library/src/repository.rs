use crate::error::{ErrorKind, Result};
use crate::loader::CorpusLoader;
use exn::OptionExt;
use futures::future::join_all;
use lectio_cache::{CacheRegistry, CacheStore, SetOptions, cached};
use lectio_corpus::{Catalog, Passage, Section, Unit, UnitMeta};
use std::sync::Arc;
use tracing::instrument;

/// Cache-first access to corpus content.
///
/// Everything else in the library reads through here, never through the
/// loader directly. Two stores back it:
///
/// - **units**: whole units keyed by unit id, filled from the loader.
/// - **sections**: single sections keyed by `unit:section`, filled from the
///   unit store.
///
/// Cloning is cheap; clones share the catalog and both stores.
#[derive(Clone)]
pub struct Repository {
    catalog: Arc<Catalog>,
    loader: CorpusLoader,
    units: CacheStore<Unit>,
    sections: CacheStore<Section>,
}

pub(crate) fn require_positive(what: &str, number: u32) -> Result<()> {
    if number == 0 {
        exn::bail!(ErrorKind::Validation(format!("{what} numbers start at 1")));
    }
    Ok(())
}

impl Repository {
    pub fn new(catalog: Arc<Catalog>, loader: CorpusLoader, units: CacheStore<Unit>, sections: CacheStore<Section>) -> Self {
        Self { catalog, loader, units, sections }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn register_caches(&self, registry: &mut CacheRegistry) {
        registry.register(&self.units);
        registry.register(&self.sections);
    }

    /// Catalog entry for a unit id.
    pub fn meta(&self, unit_id: &str) -> Result<&UnitMeta> {
        match self.catalog.get(unit_id) {
            Some(meta) => Ok(meta),
            None => exn::bail!(ErrorKind::NotFound(format!("unit {unit_id:?}"))),
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_unit(&self, unit_id: &str) -> Result<Arc<Unit>> {
        let meta = self.meta(unit_id)?;
        cached(&self.units, unit_id, SetOptions::default(), || self.loader.load(meta)).await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_section(&self, unit_id: &str, section: u32) -> Result<Arc<Section>> {
        require_positive("section", section)?;
        let key = format!("{unit_id}:{section}");
        cached(&self.sections, &key, SetOptions::default(), || async {
            let unit = self.get_unit(unit_id).await?;
            unit.section(section).cloned().ok_or_raise(|| ErrorKind::NotFound(format!("{} {section}", unit.meta.name)))
        })
        .await
    }

    pub async fn get_item(&self, unit_id: &str, section: u32, item: u32) -> Result<String> {
        require_positive("section", section)?;
        require_positive("item", item)?;
        let items = self.get_section(unit_id, section).await?;
        match items.get(&item) {
            Some(text) => Ok(text.clone()),
            None => exn::bail!(ErrorKind::NotFound(format!("{unit_id} {section}:{item}"))),
        }
    }

    /// [`get_item`](Self::get_item) with the unit's catalog details attached.
    pub async fn get_passage(&self, unit_id: &str, section: u32, item: u32) -> Result<Passage> {
        let text = self.get_item(unit_id, section, item).await?;
        Ok(Passage::new(self.meta(unit_id)?, section, item, text))
    }

    /// Load units into the cache ahead of time, all at once.
    ///
    /// Loads every unit in the catalog when `unit_ids` is `None`. Failures are
    /// logged and skipped; returns how many units are now cached.
    #[instrument(skip(self, unit_ids))]
    pub async fn warm(&self, unit_ids: Option<&[String]>) -> usize {
        let ids: Vec<&str> = match unit_ids {
            Some(ids) => ids.iter().map(String::as_str).collect(),
            None => self.catalog.units().iter().map(|meta| meta.id.as_str()).collect(),
        };
        let results = join_all(ids.iter().map(|id| self.get_unit(id))).await;
        let mut loaded = 0;
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(_) => loaded += 1,
                Err(err) => tracing::warn!(unit = *id, error = ?err, "Could not warm unit"),
            }
        }
        tracing::info!(loaded, requested = ids.len(), "Warmed unit cache");
        loaded
    }
}
