//! HTTP client for the Typesense search API.
//!
//! Wraps `reqwest` with the API-key header, collection-scoped URLs, typed
//! response decoding, and retry on transient failures.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::SearchError;
use crate::retry::retry_with_backoff;
use crate::types::{SearchParams, SearchResponse};

const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";
const DEFAULT_MAX_RETRIES: u32 = 1;
const DEFAULT_BACKOFF_BASE_MS: u64 = 200;

/// Client for one Typesense collection.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct TypesenseClient {
    client: Client,
    api_key: Option<String>,
    base_url: Url,
    collection: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for TypesenseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypesenseClient")
            .field("base_url", &self.base_url.as_str())
            .field("collection", &self.collection)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl TypesenseClient {
    /// Creates a client for `collection` at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SearchError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: Option<&str>,
        timeout_ms: u64,
        base_url: &str,
        collection: &str,
    ) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .connect_timeout(Duration::from_millis(timeout_ms))
            .user_agent("wayfind/0.1 (place-search)")
            .build()?;

        // Trailing slash so `join` appends instead of replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| SearchError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.map(ToOwned::to_owned),
            base_url,
            collection: collection.to_owned(),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the retry budget and the base back-off delay.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Runs a document search against the collection.
    ///
    /// # Errors
    ///
    /// - [`SearchError::Http`] on network failure, timeout, or non-2xx status
    ///   (after retries for transient cases).
    /// - [`SearchError::Deserialize`] if the body is not a search response.
    pub async fn search(&self, params: &SearchParams) -> Result<SearchResponse, SearchError> {
        let url = self.build_search_url(params)?;
        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.request_text(&url)
        })
        .await?;

        serde_json::from_str(&body).map_err(|e| SearchError::Deserialize {
            context: format!("search(q={})", params.q),
            source: e,
        })
    }

    /// Calls `GET /health`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the service is unreachable or unhealthy.
    pub async fn health(&self) -> Result<(), SearchError> {
        let url = self.join("health")?;
        self.request_text(&url).await?;
        Ok(())
    }

    fn build_search_url(&self, params: &SearchParams) -> Result<Url, SearchError> {
        let mut url = self.join(&format!(
            "collections/{}/documents/search",
            self.collection
        ))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params.to_query_pairs() {
                query.append_pair(key, &value);
            }
        }
        Ok(url)
    }

    fn join(&self, path: &str) -> Result<Url, SearchError> {
        self.base_url
            .join(path)
            .map_err(|e| SearchError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })
    }

    async fn request_text(&self, url: &Url) -> Result<String, SearchError> {
        let mut request = self.client.get(url.clone());
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }
        let response = request.send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
