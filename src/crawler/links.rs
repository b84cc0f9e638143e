//! Link health checking
//!
//! Every link seen during a run is checked at most once. Results live in a
//! [`LinkStatusCache`] that the coordinator creates at the start of a run and
//! hands to every page extraction, so a link shared by a hundred pages costs a
//! single HEAD request.

use crate::config::LinkCheckConfig;
use crate::url::is_http_link;
use crate::WayfinderError;
use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// Last known outcome of a link check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// Responded with HTTP 200
    Ok,
    /// Any other status (redirects included), a network error, or a timeout
    Failing,
    /// Claimed by a check that has not finished yet
    Pending,
}

#[derive(Debug)]
struct CacheInner {
    entries: Mutex<HashMap<String, LinkStatus>>,
    /// Bumped whenever a pending entry settles or is released
    settled: watch::Sender<u64>,
}

/// Run-scoped memo of link check outcomes
///
/// Cloning the cache clones a handle; all clones share the same entries. Every
/// access goes through one lock, so concurrent checkers never race on an entry,
/// and a caller that finds a link pending waits for its owner to settle it.
#[derive(Debug, Clone)]
pub struct LinkStatusCache {
    inner: Arc<CacheInner>,
}

impl Default for LinkStatusCache {
    fn default() -> Self {
        let (settled, _) = watch::channel(0);
        Self {
            inner: Arc::new(CacheInner {
                entries: Mutex::new(HashMap::new()),
                settled,
            }),
        }
    }
}

impl LinkStatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, LinkStatus>> {
        // Entries are plain values; a panicked holder cannot leave one half-written.
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn notify_settled(&self) {
        self.inner.settled.send_modify(|n| *n = n.wrapping_add(1));
    }

    /// Returns the cached status of a link
    pub fn get(&self, link: &str) -> Option<LinkStatus> {
        self.lock().get(link).copied()
    }

    /// Number of links with an entry
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Atomically claims every link that has no entry yet
    ///
    /// Claimed links are marked [`LinkStatus::Pending`] and returned; links that
    /// already have an entry (finished or in flight) are left alone.
    pub fn claim<'a, I>(&self, links: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut entries = self.lock();
        let mut claimed = Vec::new();
        for link in links {
            if !entries.contains_key(link) {
                entries.insert(link.to_string(), LinkStatus::Pending);
                claimed.push(link.to_string());
            }
        }
        claimed
    }

    /// Records the outcome of a finished check
    pub fn record(&self, link: &str, status: LinkStatus) {
        self.lock().insert(link.to_string(), status);
        if status != LinkStatus::Pending {
            self.notify_settled();
        }
    }

    /// Drops claims that were never settled so another caller can take them
    fn release(&self, links: &[String]) {
        let mut released = false;
        {
            let mut entries = self.lock();
            for link in links {
                if entries.get(link.as_str()) == Some(&LinkStatus::Pending) {
                    entries.remove(link.as_str());
                    released = true;
                }
            }
        }
        if released {
            self.notify_settled();
        }
    }

    /// True once every link has an `Ok` or `Failing` entry
    fn all_settled(&self, links: &[&str]) -> bool {
        let entries = self.lock();
        links.iter().all(|link| {
            matches!(
                entries.get(*link),
                Some(LinkStatus::Ok) | Some(LinkStatus::Failing)
            )
        })
    }
}

/// Releases a batch of claims if its checks are abandoned before recording
struct ClaimGuard<'a> {
    cache: &'a LinkStatusCache,
    links: Vec<String>,
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        self.cache.release(&self.links);
    }
}

/// Checks link health with bounded concurrency
pub struct LinkValidator {
    client: Client,
    max_concurrency: usize,
    checks_issued: AtomicUsize,
}

impl LinkValidator {
    /// Creates a validator whose HEAD requests carry `user_agent`
    ///
    /// Redirects are not followed: a link that answers 301 or 302 is reported.
    pub fn new(config: &LinkCheckConfig, user_agent: &str) -> Result<Self, WayfinderError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            max_concurrency: config.max_concurrency.max(1),
            checks_issued: AtomicUsize::new(0),
        })
    }

    /// Total HEAD requests sent by this validator
    pub fn checks_issued(&self) -> usize {
        self.checks_issued.load(Ordering::Relaxed)
    }

    /// Returns the links from `links` whose status is failing
    ///
    /// Only absolute `http`/`https` links are checked; anything else is ignored
    /// and never reported. Links already in `cache` reuse their cached outcome,
    /// and links another call is still checking are waited for. The rest are
    /// checked concurrently, at most `max_concurrency` at a time. When this
    /// returns, every checked link has a settled entry in `cache`. The result
    /// keeps the order of `links`.
    pub async fn validate(&self, links: &[String], cache: &LinkStatusCache) -> Vec<String> {
        let mut seen = HashSet::new();
        let candidates: Vec<&str> = links
            .iter()
            .map(String::as_str)
            .filter(|link| is_http_link(link))
            .filter(|link| seen.insert(*link))
            .collect();

        let mut settled = cache.inner.settled.subscribe();
        let mut first_pass = true;

        loop {
            let unchecked = cache.claim(candidates.iter().copied());

            if first_pass {
                tracing::debug!(
                    "Checking {} links ({} cached or in flight)",
                    unchecked.len(),
                    candidates.len() - unchecked.len()
                );
                first_pass = false;
            }

            if !unchecked.is_empty() {
                self.check_all(unchecked, cache).await;
            }

            if cache.all_settled(&candidates) {
                break;
            }

            tracing::trace!("Waiting on links checked by another caller");
            if settled.changed().await.is_err() {
                break;
            }
        }

        links
            .iter()
            .filter(|link| cache.get(link) == Some(LinkStatus::Failing))
            .cloned()
            .collect()
    }

    async fn check_all(&self, unchecked: Vec<String>, cache: &LinkStatusCache) {
        self.checks_issued
            .fetch_add(unchecked.len(), Ordering::Relaxed);

        let guard = ClaimGuard {
            cache,
            links: unchecked,
        };

        stream::iter(guard.links.iter().cloned())
            .map(|link| {
                let client = self.client.clone();
                async move {
                    let status = check_link(&client, &link).await;
                    (link, status)
                }
            })
            .buffer_unordered(self.max_concurrency)
            .for_each(|(link, status)| {
                cache.record(&link, status);
                futures::future::ready(())
            })
            .await;
    }
}

/// Sends one HEAD request; anything but a direct 200 is failing
async fn check_link(client: &Client, link: &str) -> LinkStatus {
    match client.head(link).send().await {
        Ok(response) if response.status() == StatusCode::OK => {
            tracing::trace!("{} -> 200", link);
            LinkStatus::Ok
        }
        Ok(response) => {
            tracing::debug!("{} -> HTTP {}", link, response.status().as_u16());
            LinkStatus::Failing
        }
        Err(e) if e.is_timeout() => {
            tracing::debug!("{} -> timed out", link);
            LinkStatus::Failing
        }
        Err(e) => {
            tracing::debug!("{} -> unreachable: {}", link, e);
            LinkStatus::Failing
        }
    }
}
