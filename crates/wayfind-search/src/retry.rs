//! Retry with exponential back-off and jitter for index requests.
//!
//! Only transient failures (network errors, 5xx) are retried. Index reads are
//! idempotent, but callers also have a raw-table fallback, so the default
//! budget is a single extra attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::SearchError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// Timeouts, connection failures, and 5xx responses are retriable. 4xx
/// responses, bad base URLs, and malformed bodies are not.
pub(crate) fn is_retriable(err: &SearchError) -> bool {
    match err {
        SearchError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        SearchError::InvalidBaseUrl { .. } | SearchError::Deserialize { .. } => false,
    }
}

const MAX_DELAY_MS: u64 = 5_000;

/// Un-jittered delay before retry number `attempt` (1-based).
fn base_delay_ms(attempt: u32, backoff_base_ms: u64) -> u64 {
    backoff_base_ms
        .saturating_mul(1u64 << (attempt - 1).min(10))
        .min(MAX_DELAY_MS)
}

/// Longest total time `max_retries` back-off sleeps can take, jitter
/// included. Callers use it to split an overall deadline across attempts.
#[must_use]
pub fn worst_case_backoff_ms(max_retries: u32, backoff_base_ms: u64) -> u64 {
    (1..=max_retries)
        .map(|attempt| base_delay_ms(attempt, backoff_base_ms).saturating_mul(5) / 4)
        .fold(0, u64::saturating_add)
}

/// Runs `operation` with up to `max_retries` additional attempts on transient
/// errors. The delay doubles per attempt from `backoff_base_ms`, gets ±25 %
/// jitter, and is capped at 5 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, SearchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SearchError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let capped = base_delay_ms(attempt, backoff_base_ms);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "search index transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn deserialize_err() -> SearchError {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        SearchError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }
    }

    async fn connect_err() -> SearchError {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1")
            .send()
            .await
            .unwrap_err();
        SearchError::Http(err)
    }

    #[test]
    fn worst_case_backoff_sums_jittered_delays() {
        assert_eq!(worst_case_backoff_ms(0, 200), 0);
        assert_eq!(worst_case_backoff_ms(1, 200), 250);
        assert_eq!(worst_case_backoff_ms(3, 200), 250 + 500 + 1_000);
        assert_eq!(worst_case_backoff_ms(2, 4_000), 5_000 + 6_250);
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        assert!(!is_retriable(&deserialize_err()));
    }

    #[test]
    fn invalid_base_url_is_not_retriable() {
        assert!(!is_retriable(&SearchError::InvalidBaseUrl {
            url: "nope".to_owned(),
            reason: "bad".to_owned(),
        }));
    }

    #[tokio::test]
    async fn connect_error_is_retriable() {
        assert!(is_retriable(&connect_err().await));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, SearchError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_connect_errors_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(1, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 2 {
                    Err::<u32, _>(connect_err().await)
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(1, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(connect_err().await)
            }
        })
        .await;
        assert!(matches!(result, Err(SearchError::Http(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2, "one try plus one retry");
    }

    #[tokio::test]
    async fn does_not_retry_deserialize_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(deserialize_err())
            }
        })
        .await;
        assert!(matches!(result, Err(SearchError::Deserialize { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
