use super::{UnitMeta, normalize};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::collections::HashMap;
use std::path::Component;
use tracing::instrument;

/// The ordered list of every unit in the corpus.
///
/// Catalog order is the corpus's natural order: search results, sampling and
/// name resolution all follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    units: Vec<UnitMeta>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting blank fields, duplicate ids and unit files
    /// that would escape the corpus root.
    pub fn new(units: Vec<UnitMeta>) -> Result<Self> {
        let mut index = HashMap::with_capacity(units.len());
        for (position, unit) in units.iter().enumerate() {
            for (field, value) in [("id", &unit.id), ("name", &unit.name), ("collection", &unit.collection)] {
                if value.trim().is_empty() {
                    exn::bail!(ErrorKind::InvalidCatalog(format!("entry {position} has an empty {field}")));
                }
            }
            let file_is_relative = !unit.file.as_os_str().is_empty()
                && unit.file.components().all(|component| matches!(component, Component::Normal(_)));
            if !file_is_relative {
                exn::bail!(ErrorKind::InvalidCatalog(format!(
                    "unit {} has an invalid file path: {}",
                    unit.id,
                    unit.file.display()
                )));
            }
            if index.insert(unit.id.clone(), position).is_some() {
                exn::bail!(ErrorKind::InvalidCatalog(format!("duplicate unit id: {}", unit.id)));
            }
        }
        Ok(Self { units, index })
    }

    /// Parse a catalog file: a JSON array of unit entries.
    #[instrument(level = "debug", skip(bytes), fields(bytes = bytes.len()))]
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let units: Vec<UnitMeta> = serde_json::from_slice(bytes)
            .or_raise(|| ErrorKind::InvalidCatalog("catalog is not a JSON array of units".to_string()))?;
        let catalog = Self::new(units)?;
        tracing::debug!(units = catalog.len(), "Parsed catalog");
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&UnitMeta> {
        self.index.get(id).map(|&position| &self.units[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn units(&self) -> &[UnitMeta] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Distinct collection names, in the order they first appear.
    pub fn collections(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for unit in &self.units {
            if !seen.contains(&unit.collection.as_str()) {
                seen.push(unit.collection.as_str());
            }
        }
        seen
    }

    /// Units in a collection (matched case-insensitively), in catalog order.
    ///
    /// Returns `None` if no unit belongs to a collection of that name.
    pub fn collection(&self, name: &str) -> Option<Vec<&UnitMeta>> {
        let wanted = normalize(name);
        let units: Vec<_> = self.units.iter().filter(|unit| normalize(&unit.collection) == wanted).collect();
        (!units.is_empty()).then_some(units)
    }

    /// Find a unit by display name.
    ///
    /// Tries, in order: an exact match (on name or id), a name starting with
    /// the query, then a name containing it. All comparisons ignore case and
    /// surplus whitespace, and the first match in catalog order wins.
    pub fn resolve_unit_name(&self, name: &str) -> Result<&UnitMeta> {
        let wanted = normalize(name);
        if wanted.is_empty() {
            exn::bail!(ErrorKind::UnknownUnit(name.to_string()));
        }
        let names: Vec<String> = self.units.iter().map(|unit| normalize(&unit.name)).collect();
        let exact = || {
            self.units
                .iter()
                .zip(&names)
                .position(|(unit, candidate)| *candidate == wanted || unit.id.eq_ignore_ascii_case(&wanted))
        };
        let prefix = || names.iter().position(|candidate| candidate.starts_with(&wanted));
        let substring = || names.iter().position(|candidate| candidate.contains(&wanted));
        match exact().or_else(prefix).or_else(substring) {
            Some(position) => Ok(&self.units[position]),
            None => exn::bail!(ErrorKind::UnknownUnit(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn unit(id: &str, name: &str, collection: &str) -> UnitMeta {
        UnitMeta {
            id: id.into(),
            name: name.into(),
            collection: collection.into(),
            file: format!("{id}.json").into(),
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            unit("genesis", "Genesis", "Old Testament"),
            unit("psalms", "Psalms", "Old Testament"),
            unit("john", "John", "New Testament"),
            unit("1john", "1 John", "New Testament"),
            unit("2john", "2 John", "New Testament"),
        ])
        .unwrap()
    }

    #[rstest]
    #[case::exact("John", "john")]
    #[case::exact_ignores_case("JOHN", "john")]
    #[case::exact_with_number("1 john", "1john")]
    #[case::extra_whitespace("  2   John ", "2john")]
    #[case::by_id("1JOHN", "1john")]
    #[case::prefix("joh", "john")]
    #[case::prefix_short("ps", "psalms")]
    #[case::substring("alm", "psalms")]
    #[case::substring_first_in_catalog_order("ohn", "john")]
    fn test_resolve_unit_name(#[case] query: &str, #[case] expected: &str) {
        assert_eq!(catalog().resolve_unit_name(query).unwrap().id, expected);
    }

    #[rstest]
    #[case::unknown("Hezekiah")]
    #[case::blank("   ")]
    fn test_resolve_unit_name_not_found(#[case] query: &str) {
        let err = catalog().resolve_unit_name(query).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnknownUnit(_)));
    }

    #[test]
    fn test_collections() {
        let catalog = catalog();
        assert_eq!(catalog.collections(), vec!["Old Testament", "New Testament"]);
        let new_testament = catalog.collection("new testament").unwrap();
        assert_eq!(new_testament.iter().map(|unit| unit.id.as_str()).collect::<Vec<_>>(), vec!["john", "1john", "2john"]);
        assert!(catalog.collection("Apocrypha").is_none());
    }

    #[test]
    fn test_index_follows_catalog_order() {
        let catalog = catalog();
        let ids = catalog.units().iter().map(|unit| unit.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids.first(), Some(&"genesis"));
        assert_eq!(ids.get(4), Some(&"2john"));
        assert_eq!(catalog.get("psalms").unwrap().name, "Psalms");
        assert!(!catalog.contains("jude"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Catalog::new(vec![unit("john", "John", "NT"), unit("john", "John again", "NT")]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidCatalog(message) if message.contains("duplicate")));
    }

    #[rstest]
    #[case::empty_name(r#"[{"id":"a","name":"","collection":"c","file":"a.json"}]"#)]
    #[case::escaping_file(r#"[{"id":"a","name":"A","collection":"c","file":"../a.json"}]"#)]
    #[case::absolute_file(r#"[{"id":"a","name":"A","collection":"c","file":"/etc/a.json"}]"#)]
    #[case::not_an_array(r#"{"id":"a"}"#)]
    #[case::missing_field(r#"[{"id":"a","name":"A","file":"a.json"}]"#)]
    fn test_invalid_catalog_json(#[case] json: &str) {
        let err = Catalog::from_json(json.as_bytes()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidCatalog(_)));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"id": "genesis", "name": "Genesis", "testament": "Old Testament", "file": "ot/genesis.json"},
            {"id": "john", "name": "John", "collection": "New Testament", "file": "nt/john.json.gz"}
        ]"#;
        let catalog = Catalog::from_json(json.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.units()[1].file, std::path::PathBuf::from("nt/john.json.gz"));
    }
}
