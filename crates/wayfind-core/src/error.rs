use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Caller contract violations for place queries.
///
/// These are the only errors the fetch operations surface to their callers;
/// backend failures are absorbed and logged instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} {value} is outside -90..=90")]
    LatitudeOutOfRange { field: &'static str, value: f64 },

    #[error("{field} {value} is outside -180..=180")]
    LongitudeOutOfRange { field: &'static str, value: f64 },

    #[error("south ({south}) must not be greater than north ({north})")]
    InvertedLatitude { south: f64, north: f64 },

    #[error("radius must be a positive number of meters, got {0}")]
    InvalidRadius(f64),

    #[error("search query must not be blank")]
    BlankQuery,

    #[error("limit must be at least 1")]
    ZeroLimit,

    #[error("place id must not be blank")]
    BlankId,
}
