//! Retry with exponential backoff for provider HTTP calls
//!
//! Only transient failures (connection errors, 5xx) are retried. Client
//! errors such as bad credentials or rate limiting fail immediately.

use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// One failed attempt
#[derive(Debug, Clone)]
pub struct RequestFailure {
    /// Detail for logs; never shown to API callers
    pub message: String,
    /// Whether another attempt may succeed
    pub transient: bool,
}

impl RequestFailure {
    /// Failure worth retrying
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: true,
        }
    }

    /// Failure that will not go away on retry
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: false,
        }
    }

    /// Classify a transport error
    pub fn from_reqwest(context: &str, err: reqwest::Error) -> Self {
        let message = format!("{}: {}", context, err);
        if err.is_connect() {
            Self::transient(message)
        } else {
            Self::fatal(message)
        }
    }

    /// Classify a non-success HTTP status
    pub fn from_status(context: &str, status: StatusCode, body: &str) -> Self {
        let message = format!("{}: HTTP {} - {}", context, status, body);
        if status.is_server_error() {
            Self::transient(message)
        } else {
            Self::fatal(message)
        }
    }
}

impl std::fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Run `operation` up to `max_retries + 1` times, sleeping 1s, 2s, 4s, ... between transient failures
pub async fn retry_request<F, Fut, T>(max_retries: u32, operation: F) -> Result<T, RequestFailure>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, RequestFailure>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(failure) if failure.transient && attempt < max_retries => {
                let delay = Duration::from_secs(2u64.pow(attempt));
                tracing::warn!(
                    "Request failed (attempt {}/{}), retrying in {:?}: {}",
                    attempt + 1,
                    max_retries + 1,
                    delay,
                    failure
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(failure) => return Err(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = retry_request(2, move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(RequestFailure::transient("HTTP 503"))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_failures_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = retry_request(3, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(RequestFailure::fatal("HTTP 401"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_are_bounded() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = retry_request(1, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(RequestFailure::transient("connection refused"))
        })
        .await;

        assert!(!result.unwrap_err().message.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_status_classification() {
        assert!(RequestFailure::from_status("x", StatusCode::BAD_GATEWAY, "").transient);
        assert!(!RequestFailure::from_status("x", StatusCode::UNAUTHORIZED, "").transient);
        assert!(!RequestFailure::from_status("x", StatusCode::TOO_MANY_REQUESTS, "").transient);
    }
}
