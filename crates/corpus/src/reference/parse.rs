use super::{ItemSelector, ParsedReference, expand_item_ranges};
use crate::error::{ErrorKind, Result};
use crate::models::Catalog;
use exn::ResultExt;
use regex::Regex;
use std::sync::LazyLock;
use tracing::instrument;

// The unit name is matched lazily so that a leading number stays part of it
// ("1 John 1:1" is unit "1 John", section 1).
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<unit>.+?)\s+(?P<section>\d+)(?:\s*[:.]\s*(?P<items>[\d\s,\-–]+?))?\s*$")
        .expect("reference pattern is valid")
});

/// Parse a reference such as `"John 3:16"`, `"1 John 1:1-4, 7"` or `"Ps 23"`.
///
/// The unit name is resolved through [`Catalog::resolve_unit_name`], so
/// abbreviations work as long as they are unambiguous in catalog order. The
/// item list is validated the same way as [`expand_item_ranges`].
#[instrument(level = "debug", skip(catalog))]
pub fn parse_reference(text: &str, catalog: &Catalog) -> Result<ParsedReference> {
    let invalid = || ErrorKind::InvalidReference(text.trim().to_string());
    let Some(captures) = REFERENCE.captures(text) else {
        exn::bail!(invalid());
    };
    let section = captures["section"].parse::<u32>().or_raise(invalid)?;
    if section == 0 {
        exn::bail!(invalid());
    }
    let items = match captures.name("items") {
        Some(items) => parse_items(items.as_str()).or_raise(invalid)?,
        None => Vec::new(),
    };
    expand_item_ranges(&items).or_raise(invalid)?;
    let unit = catalog.resolve_unit_name(&captures["unit"])?;
    Ok(ParsedReference { unit_id: unit.id.clone(), section, items })
}

fn parse_items(list: &str) -> Result<Vec<ItemSelector>> {
    list.split(',')
        .map(|part| {
            let part = part.trim();
            let number = |value: &str| {
                value
                    .trim()
                    .parse::<u32>()
                    .or_raise(|| ErrorKind::InvalidReference(format!("not an item number: {value:?}")))
            };
            match part.split_once(['-', '–']) {
                Some((start, end)) => Ok(ItemSelector::Range { start: number(start)?, end: number(end)? }),
                None => Ok(ItemSelector::Single(number(part)?)),
            }
        })
        .collect()
}
