//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building HTTP clients with the configured browser user agent
//! - Resolving request paths against the site origin
//! - Linear-backoff retries on non-success responses
//! - Rebuilding the client after transient failures
//! - Cancellation of in-flight requests and backoff sleeps

use crate::config::{RetryConfig, SiteConfig};
use crate::{ConfigError, HarvestError, Result};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How a non-success status is treated before retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Server-side or throttling failure; the connection is reset before retrying
    Transient,

    /// Request rejected by the server; retried on the same connection
    Rejected,
}

impl FailureClass {
    /// Classifies a non-success status
    ///
    /// | Status | Class |
    /// |--------|-------|
    /// | 5xx | Transient |
    /// | 408, 429 | Transient |
    /// | other | Rejected |
    pub fn classify(status: StatusCode) -> Self {
        if status.is_server_error()
            || status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
        {
            Self::Transient
        } else {
            Self::Rejected
        }
    }
}

/// Final response of a fetch, whatever its status
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub body: String,

    /// Backoff delays slept before each retry, in order
    pub delays: Vec<Duration>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn retries(&self) -> usize {
        self.delays.len()
    }

    /// Converts into the body, failing with the final status and body
    pub fn into_body(self) -> Result<String> {
        if self.status.is_success() {
            Ok(self.body)
        } else {
            Err(HarvestError::FetchFailed {
                status_code: self.status.as_u16(),
                body: self.body,
            })
        }
    }
}

/// Builds an HTTP client with the configured user agent and timeout
///
/// # Example
///
/// ```no_run
/// use pracuj_harvest::config::{SiteConfig, DEFAULT_USER_AGENT};
/// use pracuj_harvest::crawler::build_http_client;
///
/// let site = SiteConfig {
///     base_url: "https://www.pracuj.pl".to_string(),
///     search_path: "/praca".to_string(),
///     user_agent: DEFAULT_USER_AGENT.to_string(),
///     timeout_seconds: 30,
/// };
///
/// let client = build_http_client(&site).unwrap();
/// ```
pub fn build_http_client(site: &SiteConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&site.user_agent)
            .map_err(|e| ConfigError::Validation(format!("Invalid user agent: {}", e)))?,
    );

    Ok(Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(site.timeout_seconds))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?)
}

/// Fetches site pages with bounded retries
///
/// One fetcher is shared across a whole crawl phase. Its client is reused until a
/// transient failure forces a rebuild.
pub struct RetryingFetcher {
    client: Client,
    site: SiteConfig,
    base_url: Url,
    policy: RetryConfig,
    requests: u64,
    resets: u64,
}

impl RetryingFetcher {
    pub fn new(site: &SiteConfig, policy: RetryConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(site)?,
            base_url: Url::parse(&site.base_url)?,
            site: site.clone(),
            policy,
            requests: 0,
            resets: 0,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Number of HTTP requests sent so far
    pub fn request_count(&self) -> u64 {
        self.requests
    }

    /// Number of times the client was rebuilt
    pub fn reset_count(&self) -> u64 {
        self.resets
    }

    /// Delay slept before the given retry (1-based)
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        self.policy.base_delay() * retry
    }

    /// Fetches `path` and returns its body
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Body of a successful response
    /// * `Err(HarvestError::FetchFailed)` - Last status and body once retries are exhausted
    /// * `Err(HarvestError::Http)` - Transport error (not retried)
    /// * `Err(HarvestError::Cancelled)` - The token fired
    pub async fn fetch(&mut self, path: &str, cancel: &CancellationToken) -> Result<String> {
        self.fetch_response(path, cancel).await?.into_body()
    }

    /// Fetches `path`, retrying non-success responses
    ///
    /// # Retry Logic
    ///
    /// The first attempt is not a retry. After each non-success response the retry
    /// counter is incremented and the fetcher sleeps `base_delay * retry` before trying
    /// again. Once the counter exceeds `max_retries` the last response is returned as is.
    /// Transient failures (see [`FailureClass`]) rebuild the client before the sleep.
    pub async fn fetch_response(
        &mut self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchResponse> {
        let url = self.base_url.join(path)?;
        let mut delays = Vec::new();
        let mut retry: u32 = 0;

        loop {
            let (status, body) = self.send(&url, cancel).await?;

            if status.is_success() || retry >= self.policy.max_retries {
                return Ok(FetchResponse {
                    status,
                    body,
                    delays,
                });
            }

            if FailureClass::classify(status) == FailureClass::Transient {
                self.reset_client()?;
            }

            retry += 1;
            let delay = self.backoff_delay(retry);
            tracing::warn!(
                "#{} retry for {} after HTTP {}. Waiting {:.1}s",
                retry,
                url,
                status.as_u16(),
                delay.as_secs_f64()
            );
            delays.push(delay);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(HarvestError::Cancelled),
            }
            tracing::debug!("Retrying {}", url);
        }
    }

    async fn send(&mut self, url: &Url, cancel: &CancellationToken) -> Result<(StatusCode, String)> {
        if cancel.is_cancelled() {
            return Err(HarvestError::Cancelled);
        }
        self.requests += 1;

        let exchange = async {
            let response = self.client.get(url.clone()).send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        tokio::select! {
            result = exchange => Ok(result?),
            _ = cancel.cancelled() => Err(HarvestError::Cancelled),
        }
    }

    fn reset_client(&mut self) -> Result<()> {
        self.client = build_http_client(&self.site)?;
        self.resets += 1;
        tracing::debug!("HTTP client rebuilt ({} resets)", self.resets);
        Ok(())
    }
}
