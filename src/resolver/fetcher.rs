// HTTP page fetcher with politeness delay and retry/backoff

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, RETRY_AFTER};

use super::errors::{FetchFailure, ResolveError};
use super::extractors::diagnose_status;
use super::traits::{FetchConfig, FetchOutcome, PageFetcher};

/// reqwest-backed [`PageFetcher`].
///
/// The client and its headers are built once in [`HttpPageFetcher::new`] and
/// never change afterwards; share the fetcher by reference.
pub struct HttpPageFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl HttpPageFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, ResolveError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .default_headers(headers);

        if let Some(proxy_url) = config.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                ResolveError::InvalidConfig(format!("Invalid proxy URL {}: {}", proxy_url, e))
            })?;
            debug!("[Fetcher] Using proxy {}", proxy_url);
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    fn request(&self, url: &str, referer: Option<&str>) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            // embed hosts check that they are being framed
            request = request
                .header(REFERER, referer)
                .header("Sec-Fetch-Dest", "iframe")
                .header("Sec-Fetch-Mode", "navigate")
                .header("Sec-Fetch-Site", "cross-site");
        }
        request
    }

    /// Wait before the next attempt: Retry-After when the server sent one,
    /// exponential backoff otherwise, capped either way
    fn retry_delay(&self, response: &reqwest::Response, attempt: u32) -> Duration {
        let cap = Duration::from_millis(self.config.backoff_cap_ms);
        parse_retry_after(response.headers())
            .map(|d| d.min(cap))
            .unwrap_or_else(|| self.config.backoff_delay(attempt))
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str, referer: Option<&str>) -> FetchOutcome {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            tokio::time::sleep(self.config.politeness_delay()).await;

            let response = match self.request(url, referer).send().await {
                Ok(response) => response,
                Err(e) => {
                    debug!("[Fetcher] {} failed: {}", url, e);
                    return FetchOutcome::Failed(FetchFailure::from_reqwest(&e));
                }
            };

            let status = response.status().as_u16();
            if status == 200 {
                return match response.text().await {
                    Ok(body) => FetchOutcome::Page { status, body },
                    Err(e) => FetchOutcome::Failed(FetchFailure::from_reqwest(&e)),
                };
            }

            let reason = diagnose_status(status);
            if !reason.is_retryable() {
                debug!("[Fetcher] {} HTTP {}: {}", url, status, reason.description());
                return FetchOutcome::Failed(FetchFailure::Status(status));
            }

            if attempt >= self.config.max_attempts {
                warn!(
                    "[Fetcher] {} still HTTP {} after {} attempts",
                    url, status, attempt
                );
                return FetchOutcome::Failed(FetchFailure::RetriesExhausted {
                    status,
                    attempts: attempt,
                });
            }

            let delay = self.retry_delay(&response, attempt);
            debug!(
                "[Fetcher] {} HTTP {} (attempt {}/{}), retrying in {:?}",
                url, status, attempt, self.config.max_attempts, delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Retry-After in delta-seconds form; HTTP-date values are ignored
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_config() -> FetchConfig {
        FetchConfig::default()
            .with_politeness_delay(0)
            .with_backoff(1, 5)
            .with_max_attempts(3)
            .with_timeout(5)
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(7)));
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let config = fast_config().with_proxy(Some("::not a proxy::".to_string()));
        assert!(matches!(
            HttpPageFetcher::new(config),
            Err(ResolveError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_sends_referer_and_iframe_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/e/1"))
            .and(header("referer", "https://ppv.to/"))
            .and(header("sec-fetch-dest", "iframe"))
            .and(header("sec-fetch-mode", "navigate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpPageFetcher::new(fast_config()).unwrap();
        let outcome = fetcher
            .fetch(&format!("{}/e/1", server.uri()), Some("https://ppv.to/"))
            .await;

        assert_eq!(outcome, FetchOutcome::ok("<html>ok</html>"));
    }

    #[tokio::test]
    async fn test_rate_limit_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = HttpPageFetcher::new(fast_config()).unwrap();
        let outcome = fetcher.fetch(&format!("{}/busy", server.uri()), None).await;

        assert_eq!(
            outcome,
            FetchOutcome::Failed(FetchFailure::RetriesExhausted {
                status: 429,
                attempts: 3
            })
        );
    }

    #[tokio::test]
    async fn test_recovers_after_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("second time"))
            .mount(&server)
            .await;

        let fetcher = HttpPageFetcher::new(fast_config()).unwrap();
        let outcome = fetcher.fetch(&format!("{}/flaky", server.uri()), None).await;

        assert_eq!(outcome.text(), "second time");
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpPageFetcher::new(fast_config()).unwrap();
        let outcome = fetcher.fetch(&format!("{}/gone", server.uri()), None).await;

        assert_eq!(outcome, FetchOutcome::Failed(FetchFailure::Status(404)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_soft_failure() {
        let fetcher = HttpPageFetcher::new(fast_config()).unwrap();
        let outcome = fetcher.fetch("http://127.0.0.1:1/", None).await;

        assert!(matches!(outcome, FetchOutcome::Failed(FetchFailure::Network(_))));
        assert_eq!(outcome.text(), "");
    }

    #[tokio::test]
    async fn test_politeness_delay_precedes_every_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = HttpPageFetcher::new(fast_config().with_politeness_delay(200)).unwrap();
        let started = std::time::Instant::now();
        let outcome = fetcher.fetch(&format!("{}/down", server.uri()), None).await;

        assert!(
            started.elapsed() >= Duration::from_millis(600),
            "three attempts finished in {:?}",
            started.elapsed()
        );
        assert_eq!(
            outcome,
            FetchOutcome::Failed(FetchFailure::RetriesExhausted {
                status: 503,
                attempts: 3
            })
        );
    }

    #[tokio::test]
    async fn test_not_implemented_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(501))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpPageFetcher::new(fast_config()).unwrap();
        let outcome = fetcher.fetch(&format!("{}/odd", server.uri()), None).await;

        assert_eq!(outcome, FetchOutcome::Failed(FetchFailure::Status(501)));
    }

    #[tokio::test]
    async fn test_configured_user_agent_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "UA/2.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hi"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpPageFetcher::new(fast_config().with_user_agent("UA/2.0")).unwrap();
        let outcome = fetcher.fetch(&server.uri(), None).await;

        assert_eq!(outcome.text(), "hi");
    }
}
