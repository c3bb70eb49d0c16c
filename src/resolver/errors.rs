// Error types for catalog loading and page fetching

use std::fmt;

use thiserror::Error;

use super::extractors::{diagnose_failure, FailureReason};

/// Errors that abort a whole run.
///
/// Per-candidate problems never show up here: they are carried as
/// [`FetchFailure`] values and recovered by moving on to the next candidate.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Catalog could not be fetched and no cached copy exists
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Catalog payload is not in the expected shape
    #[error("Catalog parse error: {0}")]
    CatalogParse(String),

    /// HTTP client could not be built or used
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Bad proxy URL, template, etc.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ResolveError {
    fn from(e: serde_json::Error) -> Self {
        Self::CatalogParse(e.to_string())
    }
}

/// Soft failure of a single page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Connection refused, DNS, TLS, body read, ...
    Network(String),

    /// Request exceeded the per-call timeout
    Timeout,

    /// Non-200 status that is not worth retrying
    Status(u16),

    /// Retryable status kept coming back until the attempt cap
    RetriesExhausted { status: u16, attempts: u32 },
}

impl FetchFailure {
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e.to_string())
        }
    }

    /// HTTP status involved, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(code) | Self::RetriesExhausted { status: code, .. } => Some(*code),
            Self::Network(_) | Self::Timeout => None,
        }
    }

    pub fn reason(&self) -> FailureReason {
        diagnose_failure(self)
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {}", msg),
            Self::Timeout => write!(f, "request timed out"),
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::RetriesExhausted { status, attempts } => {
                write!(f, "HTTP {} after {} attempts", status, attempts)
            }
        }
    }
}

/// Why a single candidate did not produce a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateMiss {
    /// Page could not be fetched
    Fetch(FetchFailure),
    /// Page fetched, no manifest URL in it
    NoManifest,
    /// Constructed URL does not look like a manifest URL
    MalformedDirect,
}

impl fmt::Display for CandidateMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(failure) => write!(f, "{} ({})", failure, failure.reason().description()),
            Self::NoManifest => write!(f, "no manifest URL in page"),
            Self::MalformedDirect => write!(f, "constructed URL is not a manifest URL"),
        }
    }
}
