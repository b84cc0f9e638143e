use serde::Deserialize;

/// Default browser-like user agent, some sites refuse obvious bots
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Default referer sent with page fetches
pub const DEFAULT_REFERER: &str = "https://www.google.com/";

/// Main configuration structure for SEO Wayfinder
///
/// Every section is optional; a missing section falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetcher: FetcherConfig,
    pub links: LinkCheckConfig,
    pub render: RenderConfig,
    pub storage: StorageConfig,
}

/// Page and sitemap fetching behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// User-Agent header sent with every GET
    pub user_agent: String,

    /// Referer header sent with every GET
    pub referer: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Minimum delay between consecutive fetches (milliseconds)
    pub pacing_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            timeout_secs: 10,
            pacing_ms: 1000,
        }
    }
}

/// Link health checking behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LinkCheckConfig {
    /// Per-check HEAD request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum number of HEAD checks in flight at once
    pub max_concurrency: usize,
}

impl Default for LinkCheckConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_concurrency: 50,
        }
    }
}

/// Headless rendering through a WebDriver endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderConfig {
    /// Render HTML pages in a browser before extraction
    pub enabled: bool,

    /// WebDriver server (chromedriver, geckodriver, selenium)
    pub webdriver_url: String,

    /// Upper bound on the time spent rendering one page, in seconds
    pub timeout_secs: u64,

    /// How long the network must stay quiet to count as idle (milliseconds)
    pub idle_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webdriver_url: "http://localhost:4444".to_string(),
            timeout_secs: 30,
            idle_ms: 500,
        }
    }
}

/// Project database configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Path to the SQLite database file
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "seo_wayfinder.db".to_string(),
        }
    }
}
