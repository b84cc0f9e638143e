//! Crawl coordinator - main crawl orchestration logic
//!
//! This module drives one crawl run end to end:
//! - Classifying the input (sitemap URL, local sitemap file, or page URL)
//! - Expanding sitemaps into a queue of page URLs
//! - Fetching each page once, rerouting pages that turn out to be sitemaps
//! - Rendering and extracting HTML pages into [`PageRecord`]s
//! - Collecting per-URL failures without aborting the run
//!
//! The visited-sitemap set and the [`LinkStatusCache`] are created when a run
//! starts and dropped when it ends.

use crate::config::Config;
use crate::crawler::classifier::is_xml;
use crate::crawler::extractor::{extract_page, PageRecord};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::links::{LinkStatusCache, LinkValidator};
use crate::crawler::render::{Renderer, WebDriverRenderer};
use crate::crawler::sitemap::SitemapResolver;
use crate::url::CrawlInput;
use crate::WayfinderError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::time::Instant;
use url::Url;

/// A URL that was given up on, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedUrl {
    pub url: String,
    pub reason: String,
}

/// Outcome of a crawl run
///
/// `pages` maps each successfully extracted page URL to its record. URLs that
/// failed irrecoverably have no entry there and are listed in `skipped`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlResult {
    pub pages: BTreeMap<String, PageRecord>,
    pub skipped: Vec<SkippedUrl>,
}

impl CrawlResult {
    /// Number of extracted pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<&PageRecord> {
        self.pages.get(url)
    }

    /// Adds a record; a later record for the same URL replaces the earlier one
    pub fn insert(&mut self, record: PageRecord) {
        self.pages.insert(record.url.clone(), record);
    }
}

/// Main crawl coordinator
///
/// Holds the collaborators that outlive a single run (HTTP clients, renderer).
/// Run-scoped state is created fresh by [`Coordinator::run`] and
/// [`Coordinator::run_many`].
pub struct Coordinator {
    config: Config,
    fetcher: Fetcher,
    validator: LinkValidator,
    renderer: Option<Box<dyn Renderer>>,
}

impl Coordinator {
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(WayfinderError)` - The configuration is invalid or an HTTP client
    ///   could not be built
    pub fn new(config: Config) -> Result<Self, WayfinderError> {
        crate::config::validate(&config)?;
        Self::new_unchecked(config)
    }

    /// Creates a coordinator without validating `config`
    ///
    /// Accepts settings [`Coordinator::new`] rejects, such as a pacing delay
    /// below the politeness floor. Meant for crawling local mock servers.
    pub fn new_unchecked(config: Config) -> Result<Self, WayfinderError> {
        let fetcher = Fetcher::new(&config.fetcher)?;
        let validator = LinkValidator::new(&config.links, &config.fetcher.user_agent)?;

        let renderer: Option<Box<dyn Renderer>> = if config.render.enabled {
            tracing::info!("Rendering pages via WebDriver at {}", config.render.webdriver_url);
            Some(Box::new(WebDriverRenderer::new(&config.render)))
        } else {
            None
        };

        Ok(Self {
            config,
            fetcher,
            validator,
            renderer,
        })
    }

    /// Replaces the renderer used for HTML pages
    pub fn with_renderer<R>(mut self, renderer: R) -> Self
    where
        R: Renderer + 'static,
    {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The link validator shared by every run of this coordinator
    pub fn validator(&self) -> &LinkValidator {
        &self.validator
    }

    /// Crawls a single input
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `input` is neither an http(s) URL nor an
    /// existing file, and an I/O error if a local input cannot be read. Every
    /// other failure is recorded in [`CrawlResult::skipped`].
    pub async fn run(&self, input: &str) -> Result<CrawlResult, WayfinderError> {
        let input = CrawlInput::parse(input)?;
        self.run_inputs(vec![input]).await
    }

    /// Crawls several inputs in one run
    ///
    /// All inputs share the run's link cache and visited-sitemap set. Invalid
    /// entries are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if no entry is valid.
    pub async fn run_many<S>(&self, inputs: &[S]) -> Result<CrawlResult, WayfinderError>
    where
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for raw in inputs {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            match CrawlInput::parse(raw) {
                Ok(input) => parsed.push(input),
                Err(e) => tracing::warn!("Ignoring input '{}': {}", raw, e),
            }
        }

        if parsed.is_empty() {
            return Err(WayfinderError::InvalidInput(
                "no valid URL or file among the inputs".to_string(),
            ));
        }

        self.run_inputs(parsed).await
    }

    async fn run_inputs(&self, inputs: Vec<CrawlInput>) -> Result<CrawlResult, WayfinderError> {
        let start_time = Instant::now();
        let mut run = CrawlRun::new(self);

        for input in &inputs {
            tracing::info!("Starting crawl of {}", input);
            run.seed(input).await?;
        }

        run.drain().await;

        let result = run.finish();
        tracing::info!(
            "Crawl completed: {} pages extracted, {} URLs skipped in {:?}",
            result.len(),
            result.skipped.len(),
            start_time.elapsed()
        );
        Ok(result)
    }
}

/// State that lives for exactly one run
struct CrawlRun<'a> {
    coordinator: &'a Coordinator,
    sitemaps: SitemapResolver<'a>,
    link_cache: LinkStatusCache,
    queue: VecDeque<Url>,
    seen: HashSet<String>,
    result: CrawlResult,
    processed: usize,
    started: Instant,
}

impl<'a> CrawlRun<'a> {
    fn new(coordinator: &'a Coordinator) -> Self {
        Self {
            coordinator,
            sitemaps: SitemapResolver::new(&coordinator.fetcher),
            link_cache: LinkStatusCache::new(),
            queue: VecDeque::new(),
            seen: HashSet::new(),
            result: CrawlResult::default(),
            processed: 0,
            started: Instant::now(),
        }
    }

    /// Loads one input and queues the pages it leads to
    async fn seed(&mut self, input: &CrawlInput) -> Result<(), WayfinderError> {
        let location = input.location();

        let content = match (input, self.coordinator.fetcher.load(input).await) {
            (_, Ok(content)) => content,
            (CrawlInput::LocalFile(_), Err(e)) => return Err(e),
            (CrawlInput::Remote(_), Err(e)) => {
                self.skip(&location, e.to_string());
                return Ok(());
            }
        };

        if is_xml(&content, &location) {
            if self.sitemaps.mark_visited(&location) {
                let pages = self
                    .sitemaps
                    .expand(&location, input.base_url(), &content)
                    .await;
                self.enqueue_all(pages);
            } else {
                tracing::debug!("Sitemap {} already expanded in this run", location);
            }
            return Ok(());
        }

        match input {
            CrawlInput::Remote(url) => {
                if self.seen.insert(url.to_string()) {
                    self.process_html(url, content).await;
                }
            }
            CrawlInput::LocalFile(_) => {
                self.skip(&location, "local file is not a sitemap".to_string());
            }
        }

        Ok(())
    }

    /// Processes queued page URLs one at a time until the queue is empty
    async fn drain(&mut self) {
        while let Some(url) = self.queue.pop_front() {
            tracing::debug!("Processing URL: {}", url);

            let content = match self.coordinator.fetcher.fetch(&url).await {
                Ok(content) => content,
                Err(e) => {
                    self.skip(url.as_str(), e.to_string());
                    continue;
                }
            };

            if is_xml(&content, url.as_str()) {
                self.reroute_sitemap(&url, &content).await;
            } else {
                self.process_html(&url, content).await;
            }
        }
    }

    /// Expands a queued page URL that turned out to be a sitemap
    async fn reroute_sitemap(&mut self, url: &Url, content: &str) {
        if !self.sitemaps.mark_visited(url.as_str()) {
            tracing::debug!("Skipping already expanded sitemap {}", url);
            return;
        }

        tracing::info!("{} is a sitemap, expanding it", url);
        let pages = self.sitemaps.expand(url.as_str(), Some(url), content).await;
        self.enqueue_all(pages);
    }

    async fn process_html(&mut self, url: &Url, content: String) {
        let coordinator = self.coordinator;
        let html = match &coordinator.renderer {
            Some(renderer) => match renderer.render(url).await {
                Ok(rendered) => rendered,
                Err(e) => {
                    self.skip(url.as_str(), e.to_string());
                    return;
                }
            },
            None => content,
        };

        let record = extract_page(&html, url, &coordinator.validator, &self.link_cache).await;

        tracing::debug!(
            "Extracted {}: {} links ({} non-200), {} images",
            url,
            record.links.len(),
            record.non_200_links.len(),
            record.images.len()
        );
        self.result.insert(record);
        self.processed += 1;

        if self.processed % 10 == 0 {
            let elapsed = self.started.elapsed();
            let rate = self.processed as f64 / elapsed.as_secs_f64();
            tracing::info!(
                "Progress: {} pages extracted, {} in queue, {} links checked, {:.2} pages/sec",
                self.processed,
                self.queue.len(),
                self.link_cache.len(),
                rate
            );
        }
    }

    fn enqueue_all(&mut self, pages: BTreeSet<String>) {
        self.result.skipped.extend(self.sitemaps.take_skipped());

        for page in pages {
            if self.seen.contains(&page) {
                tracing::debug!("Already queued {}", page);
                continue;
            }

            match Url::parse(&page) {
                Ok(url) => {
                    self.seen.insert(page);
                    self.queue.push_back(url);
                }
                Err(e) => self.skip(&page, format!("invalid page URL: {}", e)),
            }
        }
    }

    fn skip(&mut self, url: &str, reason: String) {
        tracing::warn!("Skipping {}: {}", url, reason);
        self.result.skipped.push(SkippedUrl {
            url: url.to_string(),
            reason,
        });
    }

    fn finish(mut self) -> CrawlResult {
        self.result.skipped.extend(self.sitemaps.take_skipped());
        self.result
    }
}
