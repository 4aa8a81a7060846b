//! The shape of a corpus and how to address text inside it.
//!
//! A corpus is organised as Collection → Unit → Section → Item. The
//! [`Catalog`](models::Catalog) lists every unit up front; a unit's text is
//! loaded separately and checked by [`validate`] before anything else sees it.
//! The [`reference`] module turns human references like `"John 3:16-18"` into
//! unit ids and item numbers, and back again.

pub mod error;
pub mod models;
pub mod reference;
pub mod validate;

pub use crate::models::{Catalog, Passage, Section, Unit, UnitMeta};
pub use crate::reference::{ItemSelector, ParsedReference, expand_item_ranges, format_reference, parse_reference};
