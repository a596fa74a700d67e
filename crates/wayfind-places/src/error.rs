use thiserror::Error;
use wayfind_core::QueryError;

/// A failure of one backend during one request.
///
/// The fetcher never surfaces these to callers; it logs them and treats the
/// source as having contributed nothing.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("canonical store error: {0}")]
    Canonical(String),

    #[error("coverage store error: {0}")]
    Coverage(String),

    #[error("search index error: {0}")]
    Index(String),

    #[error("{source_name} did not answer within {timeout_ms} ms")]
    Timeout {
        source_name: &'static str,
        timeout_ms: u64,
    },
}

/// Errors returned by the public place operations.
#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] QueryError),
}
