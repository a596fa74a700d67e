//! Hybrid place search: normalization, deduplication, and the fetcher that
//! merges the canonical store, the coverage store, and the search index.

pub mod dedupe;
pub mod error;
pub mod labels;
pub mod normalize;
pub mod service;
pub mod settings;
pub mod sources;

#[cfg(test)]
pub(crate) mod test_support;

pub use dedupe::{dedupe_by_name, Deduplicator};
pub use error::{PlacesError, SourceError};
pub use labels::{CategoryLabelCache, LabelMap};
pub use normalize::{normalize_canonical, normalize_coverage, normalize_index_hit};
pub use service::{
    text_match_score, typo_budget, BoundsQuery, CoveragePath, FetchMetrics, PlaceService,
    PlacesInBounds,
};
pub use settings::SearchSettings;
pub use sources::{
    CanonicalSource, CoverageStore, IndexMatch, IndexQuery, IndexSort, LabelSource, PgCanonicalStore,
    PgCoverageStore, PgLabelSource, PlaceIndex, QueryFields, TypesenseIndex,
};
