//! HTTP fetcher implementation
//!
//! This module handles plain HTTP retrieval for the crawler:
//! - Building HTTP clients with a browser-like user agent
//! - GET requests with a Referer header and a bounded timeout
//! - Politeness pacing between consecutive fetches
//! - Reading sitemap files from local disk
//! - Error classification (timeout, non-2xx status, network failure)

use crate::config::FetcherConfig;
use crate::url::CrawlInput;
use crate::WayfinderError;
use reqwest::header::REFERER;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

/// Builds an HTTP client for page and sitemap fetches
///
/// # Example
///
/// ```no_run
/// use seo_wayfinder::config::FetcherConfig;
/// use seo_wayfinder::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Enforces a minimum delay between consecutive fetches
///
/// The first call never waits. Each later call sleeps until `delay` has passed
/// since the previous call returned.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last: Mutex::new(None),
        }
    }

    /// Waits for this caller's turn
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.delay;
            if ready_at > Instant::now() {
                tracing::trace!("Pacing: sleeping {:?}", ready_at - Instant::now());
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Retrieves raw content for crawl inputs, sitemaps, and pages
pub struct Fetcher {
    client: Client,
    referer: String,
    pacer: Pacer,
}

impl Fetcher {
    /// Creates a fetcher from configuration
    pub fn new(config: &FetcherConfig) -> Result<Self, WayfinderError> {
        Ok(Self {
            client: build_http_client(config)?,
            referer: config.referer.clone(),
            pacer: Pacer::new(Duration::from_millis(config.pacing_ms)),
        })
    }

    /// Fetches the body of `url`
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Request timed out | `Timeout` |
    /// | Non-2xx status | `HttpStatus` |
    /// | Connection or body failure | `Fetch` |
    pub async fn fetch(&self, url: &Url) -> Result<String, WayfinderError> {
        self.pacer.wait().await;
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(url.as_str());
        if !self.referer.is_empty() {
            request = request.header(REFERER, self.referer.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("GET {} returned HTTP {}", url, status.as_u16());
            return Err(WayfinderError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify_error(url, e))
    }

    /// Loads the content behind a crawl input, from the network or from disk
    pub async fn load(&self, input: &CrawlInput) -> Result<String, WayfinderError> {
        match input {
            CrawlInput::Remote(url) => self.fetch(url).await,
            CrawlInput::LocalFile(path) => {
                tracing::debug!("Reading {}", path.display());
                Ok(tokio::fs::read_to_string(path).await?)
            }
        }
    }
}

fn classify_error(url: &Url, error: reqwest::Error) -> WayfinderError {
    if error.is_timeout() {
        WayfinderError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        WayfinderError::Fetch {
            url: url.to_string(),
            reason: "Connection refused".to_string(),
        }
    } else {
        WayfinderError::Fetch {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}
