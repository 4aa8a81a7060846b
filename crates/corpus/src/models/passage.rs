use super::UnitMeta;
use crate::reference::format_reference;
use serde::{Deserialize, Serialize};

/// One item of text, together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Passage {
    pub unit_id: String,
    pub unit_name: String,
    pub collection: String,
    pub section: u32,
    pub item: u32,
    pub text: String,
}
impl Passage {
    pub fn new(meta: &UnitMeta, section: u32, item: u32, text: impl Into<String>) -> Self {
        Self {
            unit_id: meta.id.clone(),
            unit_name: meta.name.clone(),
            collection: meta.collection.clone(),
            section,
            item,
            text: text.into(),
        }
    }

    /// Human-readable reference, e.g. `"John 3:16"`.
    pub fn reference(&self) -> String {
        format_reference(&self.unit_name, self.section, &[self.item])
    }
}
