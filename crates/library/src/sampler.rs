use crate::error::{ErrorKind, Result};
use crate::repository::Repository;
use crate::scope;
use lectio_config::SamplerConfig;
use lectio_corpus::Passage;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::instrument;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleOptions {
    pub collection: Option<String>,
    pub unit_ids: Option<Vec<String>>,
    /// Fixes the random sequence, for reproducible draws.
    pub seed: Option<u64>,
}

/// The outcome of a draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub items: Vec<Passage>,
    pub requested: usize,
    /// The attempt budget ran out before `requested` distinct items were found.
    pub exhausted: bool,
}

/// Draws distinct random items.
///
/// Each attempt picks a unit uniformly from the scope, then a populated
/// section, then an item. Empty units, failed loads and repeats all use up an
/// attempt; the budget is a fixed multiple of the requested count.
#[derive(Clone)]
pub struct Sampler {
    repository: Repository,
    limits: SamplerConfig,
}

impl Sampler {
    pub fn new(repository: Repository, limits: SamplerConfig) -> Self {
        Self { repository, limits }
    }

    #[instrument(skip(self, options))]
    pub async fn sample(&self, count: usize, options: &SampleOptions) -> Result<Sample> {
        if !(1..=self.limits.max_count).contains(&count) {
            exn::bail!(ErrorKind::Validation(format!("count must be between 1 and {}", self.limits.max_count)));
        }
        let units = scope::resolve(self.repository.catalog(), options.collection.as_deref(), options.unit_ids.as_deref())?;
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let budget = count * self.limits.attempts_per_item;
        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(count);
        for _ in 0..budget {
            if items.len() == count {
                break;
            }
            let Some(meta) = units.choose(&mut rng) else {
                break;
            };
            let unit = match self.repository.get_unit(&meta.id).await {
                Ok(unit) => unit,
                Err(err) => {
                    tracing::warn!(unit = %meta.id, error = ?err, "Skipping unit that failed to load");
                    continue;
                },
            };
            let sections: Vec<u32> = unit.populated_sections().collect();
            let Some(&section) = sections.choose(&mut rng) else {
                continue;
            };
            let Some(entries) = unit.section(section) else {
                continue;
            };
            let index = rng.random_range(0..entries.len());
            let Some((&item, text)) = entries.iter().nth(index) else {
                continue;
            };
            if seen.insert((meta.id.as_str(), section, item)) {
                items.push(Passage::new(meta, section, item, text.clone()));
            }
        }

        let exhausted = items.len() < count;
        if exhausted {
            tracing::warn!(requested = count, returned = items.len(), budget, "Sampling budget exhausted");
        }
        Ok(Sample { items, requested: count, exhausted })
    }
}
