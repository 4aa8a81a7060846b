use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Item number → text. Keys are 1-based.
pub type Section = BTreeMap<u32, String>;

/// Catalog entry describing one unit (e.g. a book).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitMeta {
    /// Stable identifier, unique within the catalog (e.g. `"john"`).
    pub id: String,
    /// Display name (e.g. `"John"`).
    pub name: String,
    /// Collection the unit belongs to (e.g. `"New Testament"`).
    #[serde(alias = "testament")]
    pub collection: String,
    /// Path of the unit's data file, relative to the corpus root.
    pub file: PathBuf,
}

/// A fully loaded unit.
///
/// Built once from a validated unit file and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub meta: UnitMeta,
    pub sections: BTreeMap<u32, Section>,
}
impl Unit {
    pub fn new(meta: UnitMeta, sections: BTreeMap<u32, Section>) -> Self {
        Self { meta, sections }
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn section(&self, number: u32) -> Option<&Section> {
        self.sections.get(&number)
    }

    pub fn item(&self, section: u32, item: u32) -> Option<&str> {
        self.section(section)?.get(&item).map(String::as_str)
    }

    /// Section numbers that contain at least one item, ascending.
    pub fn populated_sections(&self) -> impl Iterator<Item = u32> + '_ {
        self.sections.iter().filter(|(_, items)| !items.is_empty()).map(|(number, _)| *number)
    }

    pub fn item_count(&self) -> usize {
        self.sections.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }
}
