// Fetch diagnostics - classifies why a candidate page could not be fetched
//
// Used for:
// - Deciding whether a status code is worth another attempt (HttpPageFetcher)
// - Log lines that say more than "HTTP 403"
// - Counting failure kinds in the run summary

use serde::{Deserialize, Serialize};

use crate::resolver::errors::FetchFailure;

/// Reasons a candidate page fetch can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// 429 Too Many Requests
    RateLimited,

    /// 500/502/503/504, transient trouble on the page host
    ServerError,

    /// 401/403, usually a missing referer or bot filtering
    Forbidden,

    /// 404/410, the event page is gone
    NotFound,

    /// Per-call timeout elapsed
    Timeout,

    /// Connection level failure (DNS, refused, TLS)
    Network,

    /// Any other non-200 status, including 501 and 505+
    UnexpectedStatus,
}

impl FailureReason {
    /// Check if waiting and asking again might help
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::ServerError)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::RateLimited => "Rate limited by upstream",
            Self::ServerError => "Upstream server error",
            Self::Forbidden => "Access denied (referer or bot check)",
            Self::NotFound => "Page not found",
            Self::Timeout => "Request timed out",
            Self::Network => "Network failure",
            Self::UnexpectedStatus => "Unexpected HTTP status",
        }
    }
}

/// Classify a status code
pub fn diagnose_status(status: u16) -> FailureReason {
    match status {
        429 => FailureReason::RateLimited,
        500 | 502 | 503 | 504 => FailureReason::ServerError,
        401 | 403 => FailureReason::Forbidden,
        404 | 410 => FailureReason::NotFound,
        _ => FailureReason::UnexpectedStatus,
    }
}

/// Classify a fetch failure
pub fn diagnose_failure(failure: &FetchFailure) -> FailureReason {
    match failure {
        FetchFailure::Timeout => FailureReason::Timeout,
        FetchFailure::Network(msg) => {
            // reqwest folds some timeouts into generic connect errors
            let lower = msg.to_lowercase();
            if lower.contains("timed out") || lower.contains("timeout") {
                FailureReason::Timeout
            } else {
                FailureReason::Network
            }
        }
        FetchFailure::Status(code) | FetchFailure::RetriesExhausted { status: code, .. } => {
            diagnose_status(*code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

    #[test]
    fn test_retryable_statuses() {
        for code in [429, 500, 502, 503, 504] {
            assert!(diagnose_status(code).is_retryable(), "{} should retry", code);
        }
        for code in [200, 301, 400, 403, 404, 501] {
            assert!(!diagnose_status(code).is_retryable(), "{} should not retry", code);
        }
    }

    #[test]
    fn test_rate_limit_detection() {
        let failure = FetchFailure::RetriesExhausted { status: 429, attempts: 3 };
        assert_eq!(diagnose_failure(&failure), FailureReason::RateLimited);
    }

    #[test]
    fn test_forbidden_detection() {
        assert_eq!(diagnose_failure(&FetchFailure::Status(403)), FailureReason::Forbidden);
        assert!(!FailureReason::Forbidden.is_retryable());
    }

    #[test]
    fn test_timeout_detection() {
        assert_eq!(diagnose_failure(&FetchFailure::Timeout), FailureReason::Timeout);
        let failure = FetchFailure::Network("operation timed out".to_string());
        assert_eq!(diagnose_failure(&failure), FailureReason::Timeout);
    }

    #[test]
    fn test_network_detection() {
        let failure = FetchFailure::Network("connection refused".to_string());
        assert_eq!(diagnose_failure(&failure), FailureReason::Network);
        assert!(!FailureReason::Network.is_retryable());
    }

    #[test]
    fn test_server_error_is_retryable() {
        assert_eq!(diagnose_status(502), FailureReason::ServerError);
        assert!(FailureReason::ServerError.is_retryable());
        assert!(!FailureReason::NotFound.is_retryable());
    }

    #[test]
    fn test_classification_matches_retry_rule() {
        for code in 400..=599u16 {
            let reason = diagnose_failure(&FetchFailure::Status(code));
            assert_eq!(
                reason.is_retryable(),
                RETRYABLE_STATUSES.contains(&code),
                "HTTP {} classified as {:?}",
                code,
                reason
            );
        }
    }

    #[test]
    fn test_unusual_server_errors_are_final() {
        assert_eq!(diagnose_status(501), FailureReason::UnexpectedStatus);
        assert_eq!(diagnose_status(505), FailureReason::UnexpectedStatus);
        assert!(!diagnose_failure(&FetchFailure::Status(501)).is_retryable());
    }
}
