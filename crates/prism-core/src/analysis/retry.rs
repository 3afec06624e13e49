//! Failure classification and backoff for vision calls.
//!
//! HTTP 429 is rate-limited; 5xx, timeouts, and connection failures are
//! transient; everything else is unrecoverable.

use std::time::Duration;

use crate::error::{AnalysisError, AnalysisErrorKind};

/// Classify a non-success HTTP response.
pub fn from_status(provider: &str, status: u16, body: &str) -> AnalysisError {
    let message = format!("{provider} HTTP {status}: {body}");
    match status {
        429 => AnalysisError::rate_limited(message).with_status(status),
        500..=599 => AnalysisError::transient(message).with_status(status),
        _ => AnalysisError::unrecoverable(message).with_status(status),
    }
}

/// Classify a transport-level failure.
pub fn from_reqwest(provider: &str, error: &reqwest::Error) -> AnalysisError {
    let message = format!("{provider} request failed: {error}");
    if error.is_timeout() || error.is_connect() || error.is_request() {
        AnalysisError::transient(message)
    } else if let Some(status) = error.status() {
        from_status(provider, status.as_u16(), &error.to_string())
    } else {
        AnalysisError::unrecoverable(message)
    }
}

/// Whether an error is worth retrying in place.
///
/// Rate limits are deliberately excluded: they are deferred, never retried
/// immediately.
pub fn is_retryable(error: &AnalysisError) -> bool {
    error.kind == AnalysisErrorKind::Transient
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let limited = from_status("openai", 429, "slow down");
        assert_eq!(limited.kind, AnalysisErrorKind::RateLimited);
        assert_eq!(limited.status_code, Some(429));

        let server = from_status("openai", 503, "unavailable");
        assert_eq!(server.kind, AnalysisErrorKind::Transient);
        assert_eq!(server.status_code, Some(503));

        let auth = from_status("anthropic", 401, "unauthorized");
        assert_eq!(auth.kind, AnalysisErrorKind::Unrecoverable);
        assert_eq!(auth.status_code, Some(401));
        assert!(auth.message.contains("anthropic HTTP 401"));
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(is_retryable(&AnalysisError::transient("blip")));
        assert!(!is_retryable(&AnalysisError::rate_limited("quota")));
        assert!(!is_retryable(&AnalysisError::unrecoverable("bad json")));
    }

    #[test]
    fn test_backoff_exponential() {
        assert_eq!(backoff_duration(0, 1000), Duration::from_millis(1000));
        assert_eq!(backoff_duration(1, 1000), Duration::from_millis(2000));
        assert_eq!(backoff_duration(3, 1000), Duration::from_millis(8000));
    }

    #[test]
    fn test_backoff_capped_at_30s() {
        assert_eq!(backoff_duration(10, 1000), Duration::from_millis(30_000));
        assert_eq!(backoff_duration(u32::MAX, 1000), Duration::from_millis(30_000));
    }
}
