use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub typesense_url: String,
    pub typesense_api_key: Option<String>,
    pub typesense_collection: String,
    pub index_max_retries: u32,
    /// Upper bound for any single backend call before it counts as failed.
    pub backend_timeout_ms: u64,
    pub fetch_limit: usize,
    pub coverage_limit: usize,
    /// Canonical result counts strictly below this trigger the coverage query.
    pub fallback_threshold: usize,
    pub dedup_radius_meters: f64,
    pub search_radius_km: f64,
    pub parallel_coverage: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("typesense_url", &self.typesense_url)
            .field(
                "typesense_api_key",
                &self.typesense_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("typesense_collection", &self.typesense_collection)
            .field("index_max_retries", &self.index_max_retries)
            .field("backend_timeout_ms", &self.backend_timeout_ms)
            .field("fetch_limit", &self.fetch_limit)
            .field("coverage_limit", &self.coverage_limit)
            .field("fallback_threshold", &self.fallback_threshold)
            .field("dedup_radius_meters", &self.dedup_radius_meters)
            .field("search_radius_km", &self.search_radius_km)
            .field("parallel_coverage", &self.parallel_coverage)
            .finish()
    }
}
