//! Sitemap resolution
//!
//! Expands a sitemap index into the flat set of leaf page URLs it ultimately
//! references. Nested sitemaps are walked with an explicit worklist, and a
//! visited set guarantees each distinct sitemap URL is expanded at most once,
//! which is what makes cyclic indices terminate.

use crate::crawler::coordinator::SkippedUrl;
use crate::crawler::fetcher::Fetcher;
use crate::url::CrawlInput;
use crate::WayfinderError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{BTreeSet, HashSet};
use url::Url;

/// The references found in one sitemap document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapDocument {
    /// Namespace URI bound to the root element, if any
    pub namespace: Option<String>,

    /// `<sitemap><loc>` entries: nested sitemaps
    pub sitemaps: Vec<String>,

    /// `<url><loc>` entries: leaf pages
    pub pages: Vec<String>,
}

/// Parses a sitemap or sitemap index
///
/// Elements are matched on their local names, so documents with a default
/// namespace, a prefixed namespace, or no namespace at all parse the same way.
/// Relative `<loc>` values are resolved against `base_url` when one is given;
/// blank or unresolvable values are dropped.
///
/// # Errors
///
/// Returns a description of the problem if the document is not well-formed XML
/// or has no root element.
pub fn parse_sitemap(xml: &str, base_url: Option<&Url>) -> Result<SitemapDocument, String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut document = SitemapDocument::default();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut loc_text: Option<String> = None;
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                if !saw_root {
                    saw_root = true;
                    document.namespace = root_namespace(&element);
                }
                let name = element.local_name().as_ref().to_vec();
                if name == b"loc" {
                    loc_text = Some(String::new());
                }
                stack.push(name);
            }
            Ok(Event::Empty(element)) => {
                if !saw_root {
                    saw_root = true;
                    document.namespace = root_namespace(&element);
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(buffer) = loc_text.as_mut() {
                    let text = text.unescape().map_err(|e| e.to_string())?;
                    buffer.push_str(&text);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(buffer) = loc_text.as_mut() {
                    buffer.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                let closed = stack.pop();
                if closed.as_deref() == Some(b"loc".as_slice()) {
                    let raw = loc_text.take().unwrap_or_default();
                    let parent = stack.last().map(Vec::as_slice);
                    let target = match parent {
                        Some(b"sitemap") => Some(&mut document.sitemaps),
                        Some(b"url") => Some(&mut document.pages),
                        _ => None,
                    };
                    if let (Some(target), Some(resolved)) = (target, resolve_loc(&raw, base_url)) {
                        target.push(resolved);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
    }

    if !saw_root {
        return Err("document has no root element".to_string());
    }
    if !stack.is_empty() {
        return Err("unexpected end of document".to_string());
    }

    Ok(document)
}

/// Namespace URI bound to the root element's prefix (or the default namespace)
fn root_namespace(root: &BytesStart<'_>) -> Option<String> {
    let name = root.name();
    let wanted: Vec<u8> = match name.prefix() {
        Some(prefix) => [b"xmlns:".as_slice(), prefix.as_ref()].concat(),
        None => b"xmlns".to_vec(),
    };

    root.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == wanted.as_slice())
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

fn resolve_loc(raw: &str, base_url: Option<&Url>) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(raw) {
        return Some(url.to_string());
    }

    match base_url.map(|base| base.join(raw)) {
        Some(Ok(url)) => Some(url.to_string()),
        _ => {
            tracing::debug!("Dropping unresolvable <loc> '{}'", raw);
            None
        }
    }
}

/// Walks sitemap hierarchies for one crawl run
///
/// The resolver owns the run's visited-sitemap set. Failures on individual
/// sitemaps are collected and can be drained with [`SitemapResolver::take_skipped`].
pub struct SitemapResolver<'a> {
    fetcher: &'a Fetcher,
    visited: HashSet<String>,
    skipped: Vec<SkippedUrl>,
}

impl<'a> SitemapResolver<'a> {
    pub fn new(fetcher: &'a Fetcher) -> Self {
        Self {
            fetcher,
            visited: HashSet::new(),
            skipped: Vec::new(),
        }
    }

    /// Marks a sitemap location as expanded; returns false if it already was
    pub fn mark_visited(&mut self, location: &str) -> bool {
        self.visited.insert(location.to_string())
    }

    /// Returns true if the sitemap location has already been expanded
    pub fn is_visited(&self, location: &str) -> bool {
        self.visited.contains(location)
    }

    /// Number of distinct sitemaps expanded so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Drains the sitemaps that could not be fetched or parsed
    pub fn take_skipped(&mut self) -> Vec<SkippedUrl> {
        std::mem::take(&mut self.skipped)
    }

    /// Resolves a sitemap input into its set of leaf page URLs
    ///
    /// # Errors
    ///
    /// Only a failure to load the input itself is returned as an error; problems
    /// further down the hierarchy are logged and skipped.
    pub async fn resolve(&mut self, input: &CrawlInput) -> Result<BTreeSet<String>, WayfinderError> {
        let location = input.location();
        if !self.mark_visited(&location) {
            tracing::debug!("Sitemap {} already expanded in this run", location);
            return Ok(BTreeSet::new());
        }

        let content = self.fetcher.load(input).await?;
        Ok(self.expand(&location, input.base_url(), &content).await)
    }

    /// Expands already-loaded sitemap content and everything it references
    ///
    /// The caller is responsible for marking `location` visited.
    pub async fn expand(
        &mut self,
        location: &str,
        base_url: Option<&Url>,
        content: &str,
    ) -> BTreeSet<String> {
        let mut pages = BTreeSet::new();
        let mut pending: Vec<String> = Vec::new();

        self.absorb(location, base_url, content, &mut pages, &mut pending);

        while let Some(sitemap) = pending.pop() {
            let url = match Url::parse(&sitemap) {
                Ok(url) => url,
                Err(e) => {
                    self.skip(&sitemap, format!("invalid sitemap URL: {}", e));
                    continue;
                }
            };

            let content = match self.fetcher.fetch(&url).await {
                Ok(content) => content,
                Err(e) => {
                    self.skip(&sitemap, e.to_string());
                    continue;
                }
            };

            self.absorb(&sitemap, Some(&url), &content, &mut pages, &mut pending);
        }

        tracing::info!(
            "Resolved {} page URLs from {} ({} sitemaps expanded this run)",
            pages.len(),
            location,
            self.visited.len()
        );

        pages
    }

    /// Parses one document, collecting its pages and queueing unseen nested sitemaps
    fn absorb(
        &mut self,
        location: &str,
        base_url: Option<&Url>,
        content: &str,
        pages: &mut BTreeSet<String>,
        pending: &mut Vec<String>,
    ) {
        let document = match parse_sitemap(content, base_url) {
            Ok(document) => document,
            Err(message) => {
                let error = WayfinderError::XmlParse {
                    url: location.to_string(),
                    message,
                };
                self.skip(location, error.to_string());
                return;
            }
        };

        tracing::debug!(
            "Sitemap {} (namespace {:?}): {} nested sitemaps, {} pages",
            location,
            document.namespace,
            document.sitemaps.len(),
            document.pages.len()
        );

        pages.extend(document.pages);

        for nested in document.sitemaps {
            if self.mark_visited(&nested) {
                pending.push(nested);
            } else {
                tracing::debug!("Skipping already expanded sitemap {}", nested);
            }
        }
    }

    fn skip(&mut self, url: &str, reason: String) {
        tracing::warn!("Skipping sitemap {}: {}", url, reason);
        self.skipped.push(SkippedUrl {
            url: url.to_string(),
            reason,
        });
    }
}
