use crate::error::{Error, ErrorKind};
use crate::sampler::SampleOptions;
use crate::search::SearchOptions;
use lectio_config::Translation;
use lectio_corpus::{ItemSelector, Passage, Section};
use serde::{Deserialize, Serialize};

/// Most selectors a single lookup may carry.
pub const MAX_LOOKUP_SELECTORS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub q: String,
    #[serde(alias = "testament")]
    pub collection: Option<String>,
    pub units: Option<Vec<String>>,
    #[serde(alias = "caseSensitive")]
    pub case_sensitive: bool,
    pub limit: Option<usize>,
    pub offset: usize,
}
impl SearchRequest {
    pub fn new(q: impl Into<String>) -> Self {
        Self { q: q.into(), ..Self::default() }
    }

    pub(crate) fn options(&self) -> SearchOptions {
        SearchOptions {
            collection: self.collection.clone(),
            unit_ids: self.units.clone(),
            case_sensitive: self.case_sensitive,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// A structured reference lookup.
///
/// `book` is matched loosely against unit names (see
/// [`Catalog::resolve_unit_name`](lectio_corpus::Catalog::resolve_unit_name)).
/// An empty `verses` list asks for the whole chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRequest {
    pub book: String,
    pub chapter: u32,
    #[serde(default)]
    pub verses: Vec<ItemSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceResponse {
    /// Canonical reference for the items actually found.
    pub reference: String,
    pub verses: Vec<Passage>,
    /// Text of every found item, space separated.
    pub text: String,
    #[serde(rename = "foundCount")]
    pub found_count: usize,
    #[serde(rename = "requestedCount")]
    pub requested_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionResponse {
    pub reference: String,
    pub unit_id: String,
    pub unit_name: String,
    pub collection: String,
    pub section: u32,
    pub items: Section,
}

/// Options for a single random item. Same scoping rules as a sample.
pub type RandomVerseOptions = SampleOptions;

/// Response shape shared with bible-api.com's `/data/{translation}/random`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomVerseResponse {
    pub translation: Translation,
    pub random_verse: RandomVerse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomVerse {
    pub book_id: String,
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
}
impl From<Passage> for RandomVerse {
    fn from(passage: Passage) -> Self {
        Self {
            book_id: passage.unit_id,
            book: passage.unit_name,
            chapter: passage.section,
            verse: passage.item,
            text: passage.text,
        }
    }
}

/// What a caller is told when a request fails.
///
/// Caller mistakes get the precise message. Operational failures get a
/// generic one, and the full error tree is logged instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub status: u16,
    pub error: String,
}
impl From<&Error> for ApiError {
    fn from(err: &Error) -> Self {
        let kind: &ErrorKind = err;
        let status = kind.status_code();
        if status >= 500 {
            tracing::error!(status, error = ?err, "Request failed");
        } else {
            tracing::debug!(status, error = %kind, "Request rejected");
        }
        Self { status, error: kind.public_message() }
    }
}
impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}
