//! Client for the Typesense search index holding both canonical and coverage
//! places.

pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use client::TypesenseClient;
pub use error::SearchError;
pub use retry::worst_case_backoff_ms;
pub use types::{CategoryLabels, GeoDistance, IndexDocument, SearchHit, SearchParams, SearchResponse};
