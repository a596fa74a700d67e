//! Shared domain types and pure logic for place discovery.
//!
//! Nothing in this crate performs I/O: it holds the unified [`PlaceCard`]
//! shape, great-circle math, category label parsing, the bounds/radius query
//! builder, and application configuration loading.

pub mod app_config;
pub mod category;
pub mod config;
pub mod error;
pub mod geo;
pub mod place;
pub mod query;

pub use app_config::{AppConfig, Environment};
pub use category::{parse_category_list, parse_category_text, ParsedCategory, DEFAULT_CATEGORY};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, QueryError};
pub use geo::{distance_meters, meters_to_miles, GeoPoint, EARTH_RADIUS_METERS};
pub use place::{
    coverage_place_id, parse_place_id, PlaceCard, PlaceSource, PlaceStatus, SearchResult,
    COVERAGE_ID_PREFIX,
};
pub use query::{
    category_filter, like_pattern, BoundingBox, CategoryFilter, GeoScope, SqlPredicate,
};
