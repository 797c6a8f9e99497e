//! Page fetching with a bounded, fixed-backoff retry policy.
//!
//! The module uses a trait-based design so the harvest pipeline never
//! depends on a concrete HTTP stack:
//! - [`PageFetcher`]: core trait, "fetch a URL, return its body"
//! - [`HttpFetcher`]: a single `reqwest` GET with timeout and user agent
//! - [`RetryFetch`]: decorator that retries any [`PageFetcher`]
//!
//! # Retry Strategy
//!
//! - At most 3 attempts
//! - Fixed 500ms pause between attempts, none after the last one
//! - No exponential growth, no jitter

use reqwest::StatusCode;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// User agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; StockHarvester/1.0)";
/// Per-attempt request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
/// Attempts per URL, including the first one.
pub const MAX_ATTEMPTS: usize = 3;
/// Pause between two attempts.
pub const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Why a fetch produced no usable body.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),

    #[error("empty response body")]
    EmptyBody,
}

/// Trait for anything that can turn a URL into page text.
///
/// Implementations report every failure as a [`FetchError`]; callers in the
/// harvest pipeline treat any error as "skip this page".
pub trait PageFetcher {
    /// Fetch `url` and return its body.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<T: PageFetcher> PageFetcher for &T {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url).await
    }
}

/// One-shot HTTP GET backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher with the harvester's user agent and timeout.
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }
        let body = response.text().await?;
        if body.is_empty() {
            return Err(FetchError::EmptyBody);
        }
        Ok(body)
    }
}

/// Wrapper that retries any [`PageFetcher`] a fixed number of times.
///
/// # Example
///
/// ```ignore
/// let fetcher = RetryFetch::new(HttpFetcher::new()?, MAX_ATTEMPTS, RETRY_BACKOFF);
/// let body = fetcher.fetch("https://cafef.vn/").await?;
/// ```
pub struct RetryFetch<T> {
    /// The underlying fetcher.
    inner: T,
    /// Total attempts before giving up.
    max_attempts: usize,
    /// Pause between attempts.
    backoff: Duration,
}

impl<T> RetryFetch<T>
where
    T: PageFetcher,
{
    pub fn new(inner: T, max_attempts: usize, backoff: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl<T> PageFetcher for RetryFetch<T>
where
    T: PageFetcher,
{
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            match self.inner.fetch(url).await {
                Ok(body) => {
                    debug!(attempt, bytes = body.len(), "Fetched page");
                    return Ok(body);
                }
                Err(e) if attempt >= self.max_attempts => {
                    warn!(
                        attempt,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        error = %e,
                        "Fetch exhausted attempts"
                    );
                    return Err(e);
                }
                Err(e) => {
                    debug!(
                        attempt,
                        max = self.max_attempts,
                        backoff = ?self.backoff,
                        error = %e,
                        "Fetch attempt failed; backing off"
                    );
                    sleep(self.backoff).await;
                }
            }
        }
    }
}

/// Build the production fetcher: [`HttpFetcher`] wrapped in the default retry policy.
pub fn default_fetcher() -> Result<RetryFetch<HttpFetcher>, FetchError> {
    Ok(RetryFetch::new(HttpFetcher::new()?, MAX_ATTEMPTS, RETRY_BACKOFF))
}
