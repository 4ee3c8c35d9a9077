//! Retry logic for network operations with error classification.

use reqwest::StatusCode;

/// Maximum number of attempts for a network operation.
pub const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Errors that should not be retried.
#[derive(Debug)]
pub enum NonRetryableError {
    /// Rate limit exceeded (HTTP 403 with rate limit message or 429)
    RateLimitExceeded(String),
    /// Authentication required (HTTP 401)
    AuthenticationFailed(String),
    /// Resource not found (HTTP 404)
    NotFound(String),
    /// Forbidden access (HTTP 403 non-rate-limit)
    Forbidden(String),
    /// Other client errors that won't succeed on retry
    ClientError(String),
}

impl std::fmt::Display for NonRetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonRetryableError::RateLimitExceeded(msg) => {
                write!(f, "Rate limit exceeded: {}. Try again later.", msg)
            }
            NonRetryableError::AuthenticationFailed(msg) => {
                write!(f, "Authentication required: {}", msg)
            }
            NonRetryableError::NotFound(msg) => write!(f, "Not found: {}", msg),
            NonRetryableError::Forbidden(msg) => write!(f, "Access forbidden: {}", msg),
            NonRetryableError::ClientError(msg) => write!(f, "Request error: {}", msg),
        }
    }
}

impl std::error::Error for NonRetryableError {}

/// Classifies an error as retryable or non-retryable.
/// Returns Ok(()) if the error is retryable, Err with a readable message if not.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let Some(status) = error.status() else {
        // Connection errors, timeouts, etc. are retryable
        return Ok(());
    };

    match status {
        StatusCode::UNAUTHORIZED => Err(NonRetryableError::AuthenticationFailed(
            "the endpoint does not allow anonymous access".to_string(),
        )),
        StatusCode::FORBIDDEN => {
            let msg = error.to_string();
            if msg.contains("rate limit") {
                Err(NonRetryableError::RateLimitExceeded(
                    "API rate limit exceeded".to_string(),
                ))
            } else {
                Err(NonRetryableError::Forbidden(
                    "access to this resource is forbidden".to_string(),
                ))
            }
        }
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimitExceeded(
            "too many requests".to_string(),
        )),
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound(
            "the requested resource was not found".to_string(),
        )),
        s if s.is_client_error() => Err(NonRetryableError::ClientError(format!(
            "HTTP {} error",
            s.as_u16()
        ))),
        // 5xx server errors are retryable
        _ => Ok(()),
    }
}

/// Checks if an error from `error_for_status()` should be retried.
/// Returns the original error if retryable, or a NonRetryableError if not.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}
