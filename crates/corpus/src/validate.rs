//! Validation of raw unit files.
//!
//! A unit file is a JSON object mapping section numbers to objects that map
//! item numbers to text:
//!
//! ```json
//! { "1": { "1": "In the beginning...", "2": "And the earth..." }, "2": { ... } }
//! ```
//!
//! Keys must be positive integers written as plain digits and every item must
//! be a non-blank string. Anything else is rejected here so that malformed
//! data never reaches a cache.

use crate::error::{ErrorKind, Result};
use crate::models::{Section, Unit, UnitMeta};
use exn::{OptionExt, ResultExt};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::instrument;

/// Parse a unit file into its sections.
#[instrument(level = "debug", skip(bytes), fields(bytes = bytes.len()))]
pub fn parse_sections(bytes: &[u8]) -> Result<BTreeMap<u32, Section>> {
    let value: Value =
        serde_json::from_slice(bytes).or_raise(|| ErrorKind::MalformedUnit("unit file is not valid JSON".to_string()))?;
    let sections = match value {
        Value::Object(sections) => sections,
        other => exn::bail!(ErrorKind::MalformedUnit(format!(
            "expected an object of sections, found {}",
            kind_of(&other)
        ))),
    };
    let mut parsed = BTreeMap::new();
    for (key, items) in sections {
        let number = parse_number(&key).ok_or_raise(|| ErrorKind::MalformedUnit(format!("invalid section number {key:?}")))?;
        let items = match items {
            Value::Object(items) => items,
            other => exn::bail!(ErrorKind::MalformedUnit(format!(
                "section {number} should be an object of items, found {}",
                kind_of(&other)
            ))),
        };
        parsed.insert(number, parse_items(number, items)?);
    }
    Ok(parsed)
}

/// Parse and validate a unit file, attaching its catalog entry.
pub fn parse_unit(meta: UnitMeta, bytes: &[u8]) -> Result<Unit> {
    let sections = parse_sections(bytes).or_raise(|| ErrorKind::MalformedUnit(format!("unit {}", meta.id)))?;
    Ok(Unit::new(meta, sections))
}

fn parse_items(section: u32, items: Map<String, Value>) -> Result<Section> {
    let mut parsed = Section::new();
    for (key, text) in items {
        let number = parse_number(&key)
            .ok_or_raise(|| ErrorKind::MalformedUnit(format!("invalid item number {key:?} in section {section}")))?;
        match text {
            Value::String(text) if !text.trim().is_empty() => {
                parsed.insert(number, text);
            },
            Value::String(_) => exn::bail!(ErrorKind::MalformedUnit(format!("item {section}:{number} is empty"))),
            other => exn::bail!(ErrorKind::MalformedUnit(format!(
                "item {section}:{number} should be text, found {}",
                kind_of(&other)
            ))),
        }
    }
    Ok(parsed)
}

/// A strictly positive integer written as plain ASCII digits.
fn parse_number(key: &str) -> Option<u32> {
    if key.is_empty() || !key.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    key.parse().ok().filter(|&number| number > 0)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_sections() {
        let json = br#"{"2": {"1": "Thus the heavens"}, "1": {"2": "And the earth", "1": "In the beginning"}, "3": {}}"#;
        let sections = parse_sections(json).unwrap();
        assert_eq!(sections.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(sections[&1].keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(sections[&1][&1], "In the beginning");
        assert!(sections[&3].is_empty());
    }

    #[test]
    fn test_numeric_ordering_not_lexical() {
        let json = br#"{"1": {"10": "ten", "9": "nine", "2": "two"}}"#;
        let sections = parse_sections(json).unwrap();
        assert_eq!(sections[&1].keys().copied().collect::<Vec<_>>(), vec![2, 9, 10]);
    }

    #[rstest]
    #[case::not_json(b"not json".as_slice())]
    #[case::array(br#"[{"1": "x"}]"#.as_slice())]
    #[case::zero_section(br#"{"0": {"1": "x"}}"#.as_slice())]
    #[case::zero_item(br#"{"1": {"0": "x"}}"#.as_slice())]
    #[case::negative(br#"{"-1": {"1": "x"}}"#.as_slice())]
    #[case::signed(br#"{"+1": {"1": "x"}}"#.as_slice())]
    #[case::word_key(br#"{"one": {"1": "x"}}"#.as_slice())]
    #[case::section_is_string(br#"{"1": "x"}"#.as_slice())]
    #[case::item_is_number(br#"{"1": {"1": 7}}"#.as_slice())]
    #[case::item_is_blank(br#"{"1": {"1": "   "}}"#.as_slice())]
    #[case::overflow(br#"{"99999999999": {"1": "x"}}"#.as_slice())]
    fn test_rejects_malformed_units(#[case] json: &[u8]) {
        let err = parse_sections(json).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedUnit(_)));
    }

    #[test]
    fn test_parse_unit_attaches_meta() {
        let meta = UnitMeta {
            id: "jude".into(),
            name: "Jude".into(),
            collection: "New Testament".into(),
            file: "nt/jude.json".into(),
        };
        let unit = parse_unit(meta, br#"{"1": {"1": "Jude, the servant of Jesus Christ"}}"#).unwrap();
        assert_eq!(unit.id(), "jude");
        assert_eq!(unit.item(1, 1), Some("Jude, the servant of Jesus Christ"));
    }
}
