use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Parsing and validation, decoupled from the process environment so it can be
/// tested with a plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(var, format!("must be a positive number, got {value}")));
        }
        Ok(value)
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("WAYFIND_ENV", "development"))?;

    let bind_addr = parse_addr("WAYFIND_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("WAYFIND_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("WAYFIND_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("WAYFIND_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("WAYFIND_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let typesense_url = or_default("WAYFIND_TYPESENSE_URL", "http://localhost:8108");
    let typesense_api_key = lookup("WAYFIND_TYPESENSE_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty());
    let typesense_collection = or_default("WAYFIND_TYPESENSE_COLLECTION", "places");
    let index_max_retries = parse_u32("WAYFIND_INDEX_MAX_RETRIES", "1")?;

    let backend_timeout_ms = parse_u64("WAYFIND_BACKEND_TIMEOUT_MS", "3000")?;
    if backend_timeout_ms == 0 {
        return Err(invalid("WAYFIND_BACKEND_TIMEOUT_MS", "must be greater than 0".into()));
    }
    let fetch_limit = parse_usize("WAYFIND_FETCH_LIMIT", "150")?;
    let coverage_limit = parse_usize("WAYFIND_COVERAGE_LIMIT", "100")?;
    let fallback_threshold = parse_usize("WAYFIND_FALLBACK_THRESHOLD", "40")?;
    let dedup_radius_meters = parse_positive_f64("WAYFIND_DEDUP_RADIUS_METERS", "100")?;
    let search_radius_km = parse_positive_f64("WAYFIND_SEARCH_RADIUS_KM", "50")?;
    let parallel_coverage = parse_bool("WAYFIND_PARALLEL_COVERAGE", "false")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        typesense_url,
        typesense_api_key,
        typesense_collection,
        index_max_retries,
        backend_timeout_ms,
        fetch_limit,
        coverage_limit,
        fallback_threshold,
        dedup_radius_meters,
        search_radius_km,
        parallel_coverage,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "WAYFIND_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
