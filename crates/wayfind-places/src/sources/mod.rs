//! Backend seams for the hybrid fetcher.
//!
//! Each trait returns normalized [`PlaceCard`]s so the fetcher never sees
//! backend row shapes. Production adapters live in [`postgres`] and
//! [`typesense`]; tests substitute in-memory fakes.

pub mod postgres;
pub mod typesense;

use async_trait::async_trait;
use wayfind_core::{CategoryFilter, GeoPoint, GeoScope, PlaceCard, PlaceSource};
use wayfind_db::CategoryLabelRow;

use crate::error::SourceError;

pub use postgres::{PgCanonicalStore, PgCoverageStore, PgLabelSource};
pub use typesense::TypesenseIndex;

/// The curated places table.
#[async_trait]
pub trait CanonicalSource: Send + Sync {
    /// Active places inside `scope`, most popular first.
    async fn places_in_scope(
        &self,
        scope: &GeoScope,
        category: Option<&CategoryFilter>,
        limit: usize,
    ) -> Result<Vec<PlaceCard>, SourceError>;

    async fn place_by_id(&self, id: &str) -> Result<Option<PlaceCard>, SourceError>;
}

/// Direct access to the raw coverage table. Slow; used only when the index
/// fails.
#[async_trait]
pub trait CoverageStore: Send + Sync {
    /// Open places inside `scope` whose native id is not in `exclude_ids`.
    async fn places_in_scope(
        &self,
        scope: &GeoScope,
        category: Option<&CategoryFilter>,
        exclude_ids: &[String],
        limit: usize,
    ) -> Result<Vec<PlaceCard>, SourceError>;

    /// Case-insensitive name substring search.
    async fn search_by_name(
        &self,
        term: &str,
        scope: Option<&GeoScope>,
        limit: usize,
    ) -> Result<Vec<PlaceCard>, SourceError>;

    async fn place_by_id(&self, native_id: &str) -> Result<Option<PlaceCard>, SourceError>;
}

/// Full-text and geo search over both sources.
#[async_trait]
pub trait PlaceIndex: Send + Sync {
    async fn search(&self, query: &IndexQuery) -> Result<Vec<IndexMatch>, SourceError>;
}

/// Near-static category display metadata.
#[async_trait]
pub trait LabelSource: Send + Sync {
    async fn load_labels(&self) -> Result<Vec<CategoryLabelRow>, SourceError>;
}

/// Which fields a text query matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFields {
    /// Name, category, and locality, weighted toward name.
    Full,
    /// Name only, for autocomplete.
    NameOnly,
}

/// How the index should order hits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndexSort {
    /// Engine default.
    Unsorted,
    /// Nearest first.
    Distance(GeoPoint),
    /// Text relevance, then popularity, then distance when an origin is given.
    Relevance(Option<GeoPoint>),
}

/// A backend-neutral index request.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexQuery {
    /// Free text; `None` matches every document.
    pub text: Option<String>,
    pub fields: QueryFields,
    pub scope: Option<GeoScope>,
    pub category: Option<CategoryFilter>,
    /// Restrict hits to one provenance.
    pub source: Option<PlaceSource>,
    /// Coverage native ids to leave out.
    pub exclude_ids: Vec<String>,
    pub sort: IndexSort,
    pub limit: usize,
    pub num_typos: u8,
    pub prefix: bool,
}

impl IndexQuery {
    /// A match-all geo query, as used to fill a viewport.
    #[must_use]
    pub fn browse(scope: GeoScope, limit: usize) -> Self {
        Self {
            text: None,
            fields: QueryFields::Full,
            scope: Some(scope),
            category: None,
            source: None,
            exclude_ids: Vec::new(),
            sort: IndexSort::Unsorted,
            limit,
            num_typos: 0,
            prefix: false,
        }
    }

    /// A prefix text query with the given typo budget.
    #[must_use]
    pub fn text(text: &str, fields: QueryFields, num_typos: u8, limit: usize) -> Self {
        Self {
            text: Some(text.to_string()),
            fields,
            scope: None,
            category: None,
            source: None,
            exclude_ids: Vec::new(),
            sort: IndexSort::Relevance(None),
            limit,
            num_typos,
            prefix: true,
        }
    }
}

/// A normalized index hit with the engine's relevance.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    pub place: PlaceCard,
    /// Engine score; only comparable within one response.
    pub text_match: Option<u64>,
}
