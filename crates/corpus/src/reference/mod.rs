//! Addressing items: ranges, reference formatting and reference parsing.

mod parse;

pub use self::parse::parse_reference;
use crate::error::{ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Widest range accepted by [`expand_item_ranges`], inclusive of both ends.
pub const MAX_RANGE_SPAN: u32 = 50;

/// Either a single item number or an inclusive range of them.
///
/// Deserializes from a bare number (`16`) or an object (`{"start": 16, "end": 18}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemSelector {
    Single(u32),
    Range { start: u32, end: u32 },
}
impl From<u32> for ItemSelector {
    fn from(item: u32) -> Self {
        Self::Single(item)
    }
}
impl From<(u32, u32)> for ItemSelector {
    fn from((start, end): (u32, u32)) -> Self {
        Self::Range { start, end }
    }
}
impl Display for ItemSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Single(item) => write!(f, "{item}"),
            Self::Range { start, end } => write!(f, "{start}-{end}"),
        }
    }
}

/// A reference resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedReference {
    pub unit_id: String,
    pub section: u32,
    /// Empty when the reference names a whole section.
    pub items: Vec<ItemSelector>,
}

/// Flatten selectors into a sorted, de-duplicated list of item numbers.
///
/// # Errors
///
/// [`InvalidRange`](ErrorKind::InvalidRange) if any selector uses item zero,
/// has its end before its start, or spans more than [`MAX_RANGE_SPAN`] items.
///
/// # Examples
///
/// ```
/// use lectio_corpus::{ItemSelector, expand_item_ranges};
///
/// let items = expand_item_ranges(&[ItemSelector::Range { start: 1, end: 3 }, ItemSelector::Single(5)]).unwrap();
/// assert_eq!(items, vec![1, 2, 3, 5]);
/// ```
pub fn expand_item_ranges(selectors: &[ItemSelector]) -> Result<Vec<u32>> {
    let mut items = Vec::new();
    for selector in selectors {
        match *selector {
            ItemSelector::Single(0) | ItemSelector::Range { start: 0, .. } => {
                exn::bail!(ErrorKind::InvalidRange(format!("{selector}: item numbers start at 1")));
            },
            ItemSelector::Single(item) => items.push(item),
            ItemSelector::Range { start, end } if end < start => {
                exn::bail!(ErrorKind::InvalidRange(format!("{selector}: end is before start")));
            },
            ItemSelector::Range { start, end } if end - start + 1 > MAX_RANGE_SPAN => {
                exn::bail!(ErrorKind::InvalidRange(format!("{selector}: spans more than {MAX_RANGE_SPAN} items")));
            },
            ItemSelector::Range { start, end } => items.extend(start..=end),
        }
    }
    items.sort_unstable();
    items.dedup();
    Ok(items)
}

/// Human-readable reference for items in one section.
///
/// Consecutive items collapse into `a-b` runs joined by `", "`.
///
/// # Examples
///
/// ```
/// use lectio_corpus::format_reference;
///
/// assert_eq!(format_reference("Genesis", 1, &[1, 2, 3, 5]), "Genesis 1:1-3, 5");
/// assert_eq!(format_reference("John", 3, &[16]), "John 3:16");
/// assert_eq!(format_reference("Psalms", 23, &[]), "Psalms 23");
/// ```
pub fn format_reference(unit_name: &str, section: u32, items: &[u32]) -> String {
    let mut items = items.to_vec();
    items.sort_unstable();
    items.dedup();
    let Some((&first, rest)) = items.split_first() else {
        return format!("{unit_name} {section}");
    };
    let mut runs = Vec::new();
    let (mut start, mut end) = (first, first);
    for &item in rest {
        if item == end + 1 {
            end = item;
        } else {
            runs.push((start, end));
            (start, end) = (item, item);
        }
    }
    runs.push((start, end));
    let runs = runs
        .into_iter()
        .map(|(start, end)| if start == end { start.to_string() } else { format!("{start}-{end}") })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{unit_name} {section}:{runs}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::single(vec![ItemSelector::Single(7)], vec![7])]
    #[case::range_and_single(vec![(1, 3).into(), 5.into()], vec![1, 2, 3, 5])]
    #[case::overlapping(vec![(1, 4).into(), (3, 6).into(), 2.into()], vec![1, 2, 3, 4, 5, 6])]
    #[case::unordered(vec![9.into(), 2.into()], vec![2, 9])]
    #[case::degenerate_range(vec![(4, 4).into()], vec![4])]
    #[case::widest_allowed(vec![(1, 50).into()], (1..=50).collect())]
    #[case::empty(vec![], vec![])]
    fn test_expand_item_ranges(#[case] selectors: Vec<ItemSelector>, #[case] expected: Vec<u32>) {
        assert_eq!(expand_item_ranges(&selectors).unwrap(), expected);
    }

    #[rstest]
    #[case::reversed((5, 2).into())]
    #[case::too_wide((1, 51).into())]
    #[case::zero_single(0.into())]
    #[case::zero_start((0, 3).into())]
    fn test_expand_item_ranges_rejects(#[case] selector: ItemSelector) {
        let err = expand_item_ranges(&[1.into(), selector]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidRange(_)));
    }

    #[rstest]
    #[case::runs("Genesis", 1, &[1, 2, 3, 5], "Genesis 1:1-3, 5")]
    #[case::single("John", 3, &[16], "John 3:16")]
    #[case::whole_section("Psalms", 23, &[], "Psalms 23")]
    #[case::unsorted_input("Ruth", 1, &[3, 1, 2, 2], "Ruth 1:1-3")]
    #[case::several_runs("1 John", 1, &[1, 2, 4, 6, 7, 8], "1 John 1:1-2, 4, 6-8")]
    fn test_format_reference(#[case] name: &str, #[case] section: u32, #[case] items: &[u32], #[case] expected: &str) {
        assert_eq!(format_reference(name, section, items), expected);
    }

    #[test]
    fn test_selector_deserializes_number_or_range() {
        let selectors: Vec<ItemSelector> = serde_json::from_str(r#"[16, {"start": 17, "end": 18}]"#).unwrap();
        assert_eq!(selectors, vec![ItemSelector::Single(16), ItemSelector::Range { start: 17, end: 18 }]);
    }
}
