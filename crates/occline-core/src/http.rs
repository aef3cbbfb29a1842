//! Blocking HTTP facade over a shared async reqwest client.
//!
//! Uses async reqwest internally with a small dedicated tokio runtime,
//! but presents a sync interface so the pipeline stages stay sequential.

use std::sync::LazyLock;
use std::time::Duration;

use serde::de::DeserializeOwned;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-request timeout for API calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Error from a remote API call, with optional HTTP status.
#[derive(Debug)]
pub struct HttpError {
    pub status: Option<u16>,
    pub message: String,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(s) => write!(f, "HTTP {s}: {}", self.message),
            None => write!(f, "HTTP error: {}", self.message),
        }
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        Self {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }

    /// Transient failures (rate limit, server error, connection-level
    /// error without a status) are worth one more attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self.status, Some(429) | Some(500..=599) | None)
    }
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .pool_max_idle_per_host(8)
        .build()
        .expect("failed to build HTTP client")
});

/// Shared tokio runtime for HTTP operations.
static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Exponential backoff: 2^attempt seconds (2s, 4s, 8s, ...)
pub const fn backoff_duration(attempt: u32) -> Duration {
    Duration::from_secs(2u64.pow(attempt))
}

/// Blocking GET returning deserialized JSON.
pub fn get_json<T: DeserializeOwned>(
    url: &str,
    query: &[(&str, String)],
) -> Result<T, HttpError> {
    SHARED_RUNTIME.handle().block_on(async {
        let resp = SHARED_CLIENT
            .get(url)
            .query(query)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| HttpError::from_reqwest(&e))?;
        resp.json::<T>()
            .await
            .map_err(|e| HttpError::from_reqwest(&e))
    })
}

/// GET with bounded retry for transient failures.
///
/// `max_retries` is the number of *additional* attempts after the first;
/// each retry sleeps an exponential backoff. Non-retryable errors (e.g.
/// HTTP 404) surface immediately.
pub fn get_json_retry<T: DeserializeOwned>(
    url: &str,
    query: &[(&str, String)],
    max_retries: u32,
) -> Result<T, HttpError> {
    let mut attempt = 0u32;
    loop {
        match get_json(url, query) {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_retries && e.is_retryable() => {
                attempt += 1;
                let delay = backoff_duration(attempt);
                log::warn!("request failed ({e}), retry {attempt}/{max_retries} in {delay:?}");
                std::thread::sleep(delay);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Lightweight existence check: HEAD request, success = 2xx/3xx.
///
/// Timeouts and connection errors count as unreachable rather than
/// surfacing an error; the media validator folds them into its totals.
pub fn head_ok(url: &str, timeout: Duration) -> bool {
    SHARED_RUNTIME.handle().block_on(async {
        match SHARED_CLIENT.head(url).timeout(timeout).send().await {
            Ok(resp) => {
                let status = resp.status();
                status.is_success() || status.is_redirection()
            }
            Err(_) => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_err(status: u16) -> HttpError {
        HttpError {
            status: Some(status),
            message: "test".to_string(),
        }
    }

    #[test]
    fn http_500_retryable() {
        assert!(http_err(500).is_retryable());
    }

    #[test]
    fn http_429_retryable() {
        assert!(http_err(429).is_retryable());
    }

    #[test]
    fn http_404_not_retryable() {
        assert!(!http_err(404).is_retryable());
    }

    #[test]
    fn http_400_not_retryable() {
        assert!(!http_err(400).is_retryable());
    }

    #[test]
    fn no_status_retryable() {
        // Connection-level error without a status code
        let err = HttpError {
            status: None,
            message: "connection refused".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn display_with_status() {
        assert_eq!(format!("{}", http_err(404)), "HTTP 404: test");
    }

    #[test]
    fn display_without_status() {
        let err = HttpError {
            status: None,
            message: "timeout".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP error: timeout");
    }

    #[test]
    fn backoff_exponential() {
        assert_eq!(backoff_duration(1), Duration::from_secs(2));
        assert_eq!(backoff_duration(2), Duration::from_secs(4));
        assert_eq!(backoff_duration(3), Duration::from_secs(8));
    }
}
