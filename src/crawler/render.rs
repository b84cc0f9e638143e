//! Headless rendering for script-driven pages
//!
//! Pages whose content only exists after JavaScript runs are loaded in a real
//! browser through a WebDriver endpoint and read back once the network has gone
//! quiet.

use crate::config::RenderConfig;
use crate::WayfinderError;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// How often the page is polled while waiting for network idle
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on closing a session, separate from the render timeout
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Script returning the document ready state and the number of resources loaded so far
const READY_STATE_SCRIPT: &str =
    "return [document.readyState, performance.getEntriesByType('resource').length];";

/// Produces the fully rendered HTML of a page
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &Url) -> Result<String, WayfinderError>;
}

/// [`Renderer`] backed by a WebDriver server (chromedriver, geckodriver, selenium)
///
/// Each render opens a fresh headless session and always closes it.
pub struct WebDriverRenderer {
    webdriver_url: String,
    timeout: Duration,
    idle: Duration,
}

impl WebDriverRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            idle: Duration::from_millis(config.idle_ms),
        }
    }

    fn capabilities() -> Map<String, Value> {
        let mut caps = Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": ["--headless=new", "--disable-gpu", "--no-sandbox"] }),
        );
        caps.insert(
            "moz:firefoxOptions".to_string(),
            json!({ "args": ["-headless"] }),
        );
        caps
    }

    async fn connect(&self, url: &Url) -> Result<Client, WayfinderError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(Self::capabilities());
        builder
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| WayfinderError::Render {
                url: url.to_string(),
                message: format!("cannot connect to WebDriver at {}: {}", self.webdriver_url, e),
            })
    }

    /// Navigates and waits until the resource count has been stable for `idle`
    async fn load_until_idle(&self, client: &Client, url: &Url) -> Result<String, WayfinderError> {
        let render_error = |e: fantoccini::error::CmdError| WayfinderError::Render {
            url: url.to_string(),
            message: e.to_string(),
        };

        client.goto(url.as_str()).await.map_err(render_error)?;

        let mut last_count: Option<u64> = None;
        let mut quiet_since = Instant::now();

        loop {
            let state = client
                .execute(READY_STATE_SCRIPT, Vec::new())
                .await
                .map_err(render_error)?;

            let complete = state.get(0).and_then(Value::as_str) == Some("complete");
            let count = state.get(1).and_then(Value::as_u64).unwrap_or(0);

            if last_count != Some(count) {
                last_count = Some(count);
                quiet_since = Instant::now();
            } else if complete && quiet_since.elapsed() >= self.idle {
                break;
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }

        client.source().await.map_err(render_error)
    }

    fn timed_out(&self, url: &Url, stage: &str) -> WayfinderError {
        WayfinderError::Render {
            url: url.to_string(),
            message: format!("{} did not finish within {:?}", stage, self.timeout),
        }
    }
}

#[async_trait]
impl Renderer for WebDriverRenderer {
    /// Connecting and loading share one deadline of `timeout`; closing the
    /// session is capped on its own.
    async fn render(&self, url: &Url) -> Result<String, WayfinderError> {
        tracing::debug!("Rendering {} via {}", url, self.webdriver_url);
        let deadline = Instant::now() + self.timeout;

        let client = tokio::time::timeout_at(deadline, self.connect(url))
            .await
            .map_err(|_| self.timed_out(url, "WebDriver session setup"))??;

        let outcome = tokio::time::timeout_at(deadline, self.load_until_idle(&client, url)).await;

        match tokio::time::timeout(CLOSE_TIMEOUT, client.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("Failed to close WebDriver session for {}: {}", url, e),
            Err(_) => tracing::debug!("Timed out closing WebDriver session for {}", url),
        }

        outcome.map_err(|_| self.timed_out(url, "page load"))?
    }
}
