use crate::WayfinderError;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Where a crawl starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlInput {
    /// A remote sitemap or page URL
    Remote(Url),

    /// A sitemap file on local disk
    LocalFile(PathBuf),
}

impl CrawlInput {
    /// Classifies a raw command-line input
    ///
    /// `http`/`https` URLs become [`CrawlInput::Remote`], paths to existing files
    /// become [`CrawlInput::LocalFile`]; anything else is
    /// [`WayfinderError::InvalidInput`].
    pub fn parse(raw: &str) -> Result<Self, WayfinderError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(WayfinderError::InvalidInput("empty input".to_string()));
        }

        if let Ok(url) = Url::parse(raw) {
            if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() {
                return Ok(Self::Remote(url));
            }
        }

        let path = Path::new(raw);
        if path.is_file() {
            return Ok(Self::LocalFile(path.to_path_buf()));
        }

        Err(WayfinderError::InvalidInput(format!(
            "'{}' is neither an http(s) URL nor an existing file",
            raw
        )))
    }

    /// The string used to identify this input in logs and in the crawl result
    pub fn location(&self) -> String {
        match self {
            Self::Remote(url) => url.to_string(),
            Self::LocalFile(path) => path.display().to_string(),
        }
    }

    /// Base URL for resolving relative references, if the input has one
    pub fn base_url(&self) -> Option<&Url> {
        match self {
            Self::Remote(url) => Some(url),
            Self::LocalFile(_) => None,
        }
    }
}

impl fmt::Display for CrawlInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location())
    }
}
