// PageFetcher / CatalogSource traits and fetch configuration

use std::time::Duration;

use async_trait::async_trait;

use super::errors::{FetchFailure, ResolveError};
use super::models::Catalog;

/// Browser-like UA sent with every page request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Result of one page fetch (after retries)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 200 response with its body
    Page { status: u16, body: String },
    /// Anything else; never an error, the caller moves on
    Failed(FetchFailure),
}

impl FetchOutcome {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::Page {
            status: 200,
            body: body.into(),
        }
    }

    /// Body text, empty for failures
    pub fn text(&self) -> &str {
        match self {
            Self::Page { body, .. } => body,
            Self::Failed(_) => "",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Page { .. })
    }
}

/// Configuration for page fetching
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    /// Pause before every request, retries included
    pub politeness_delay_ms: u64,
    /// Total attempts for a retryable status (1 = no retry)
    pub max_attempts: u32,
    /// First backoff; doubled per attempt
    pub backoff_base_ms: u64,
    /// Upper bound for a single backoff (also caps Retry-After)
    pub backoff_cap_ms: u64,
    /// HTTP/HTTPS/SOCKS5 proxy URL
    pub proxy: Option<String>,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 20,
            politeness_delay_ms: 300,
            max_attempts: 3,
            backoff_base_ms: 500,
            backoff_cap_ms: 8_000,
            proxy: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_politeness_delay(mut self, millis: u64) -> Self {
        self.politeness_delay_ms = millis;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, base_ms: u64, cap_ms: u64) -> Self {
        self.backoff_base_ms = base_ms;
        self.backoff_cap_ms = cap_ms.max(base_ms);
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    /// Backoff before attempt `attempt + 1`, `attempt` starting at 1
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        let millis = self
            .backoff_base_ms
            .saturating_mul(factor)
            .min(self.backoff_cap_ms);
        Duration::from_millis(millis)
    }
}

/// Performs a single page GET
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`, sending `referer` and iframe navigation headers when given
    async fn fetch(&self, url: &str, referer: Option<&str>) -> FetchOutcome;
}

/// Loads the catalog of descriptors for one site
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Name of the source (for logging and cache file naming)
    fn name(&self) -> &'static str;

    async fn fetch_catalog(&self, fetcher: &dyn PageFetcher) -> Result<Catalog, ResolveError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = FetchConfig::default().with_backoff(500, 3_000);
        assert_eq!(config.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(config.backoff_delay(2), Duration::from_millis(1_000));
        assert_eq!(config.backoff_delay(3), Duration::from_millis(2_000));
        assert_eq!(config.backoff_delay(4), Duration::from_millis(3_000));
        assert_eq!(config.backoff_delay(40), Duration::from_millis(3_000));
    }

    #[test]
    fn test_attempts_at_least_one() {
        assert_eq!(FetchConfig::default().with_max_attempts(0).max_attempts, 1);
    }

    #[test]
    fn test_failed_outcome_has_empty_text() {
        let outcome = FetchOutcome::Failed(FetchFailure::Status(500));
        assert_eq!(outcome.text(), "");
        assert!(!outcome.is_success());
        assert_eq!(FetchOutcome::ok("body").text(), "body");
    }
}
