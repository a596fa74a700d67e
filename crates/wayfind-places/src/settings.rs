use std::time::Duration;

use wayfind_core::AppConfig;

/// Tunables for the hybrid fetcher.
#[derive(Debug, Clone, Copy)]
pub struct SearchSettings {
    /// Cap on canonical rows and on the final bounds result.
    pub fetch_limit: usize,
    pub coverage_limit: usize,
    /// Canonical counts strictly below this trigger the coverage query.
    pub fallback_threshold: usize,
    pub dedup_radius_meters: f64,
    /// Geo-bias radius for text search and its raw-table fallback.
    pub search_radius_meters: f64,
    pub backend_timeout: Duration,
    /// Issue the coverage query alongside the canonical one instead of after it.
    pub parallel_coverage: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            fetch_limit: 150,
            coverage_limit: 100,
            fallback_threshold: 40,
            dedup_radius_meters: 100.0,
            search_radius_meters: 50_000.0,
            backend_timeout: Duration::from_millis(3_000),
            parallel_coverage: false,
        }
    }
}

impl SearchSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            fetch_limit: config.fetch_limit,
            coverage_limit: config.coverage_limit,
            fallback_threshold: config.fallback_threshold,
            dedup_radius_meters: config.dedup_radius_meters,
            search_radius_meters: config.search_radius_km * 1_000.0,
            backend_timeout: Duration::from_millis(config.backend_timeout_ms),
            parallel_coverage: config.parallel_coverage,
        }
    }
}
