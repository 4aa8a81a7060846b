mod catalog;
mod passage;
mod unit;

pub use self::catalog::Catalog;
pub use self::passage::Passage;
pub use self::unit::{Section, Unit, UnitMeta};

/// Normalise a user-supplied name for comparison: trimmed, lowercased, with
/// runs of whitespace collapsed to a single space.
fn normalize(s: impl AsRef<str>) -> String {
    s.as_ref().split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
