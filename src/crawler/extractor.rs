//! Page extraction
//!
//! Turns a fetched HTML document into a [`PageRecord`]:
//! - Title, meta description, robots directive, canonical
//! - Headings h1 to h6, paragraphs
//! - Links (split into internal and external), hreflang alternates
//! - Images with alt text, scripts, stylesheets
//! - JSON-LD structured data
//! - Slug and URL parts of the page itself
//!
//! Link health is filled in by the [`LinkValidator`] against the run's shared
//! [`LinkStatusCache`].

use crate::crawler::links::{LinkStatusCache, LinkValidator};
use crate::url::{is_same_host, resolve_href, split_url, UrlParts};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

/// Heading levels, in the order they are reported
pub const HEADING_LEVELS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// An image reference on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Absolute image URL
    pub src: String,

    /// Trimmed alt text, empty when missing
    pub alt: String,
}

/// Everything extracted from one HTML page
///
/// Produced once per page URL per crawl run. `internal_links` and
/// `external_links` partition `links`; `missing_alt_images` and `non_200_links`
/// are subsets of `images` and `links`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// The page URL the record was extracted from
    pub url: String,

    pub title: String,
    pub meta_description: String,
    pub canonical: Option<String>,

    /// Raw `<meta name="robots">` content
    pub robots: Option<String>,
    pub noindex: bool,

    /// `h1`..`h6` to heading texts in document order; every level is present
    pub headings: BTreeMap<String, Vec<String>>,

    pub links: Vec<String>,
    pub internal_links: Vec<String>,
    pub external_links: Vec<String>,

    /// Language-region tag to alternate URL
    pub hreflang: BTreeMap<String, String>,

    pub images: Vec<Image>,

    /// `src` of every image whose alt text is empty
    pub missing_alt_images: Vec<String>,

    pub paragraphs: Vec<String>,
    pub scripts: Vec<String>,
    pub stylesheets: Vec<String>,

    /// Parsed JSON-LD blocks; malformed blocks are dropped
    pub structured_data: Vec<Value>,

    pub slug: String,
    pub url_parts: UrlParts,

    /// Links whose last known status was not 200 or that were unreachable
    pub non_200_links: Vec<String>,
}

/// Extracts a page and checks its links
///
/// # Example
///
/// ```no_run
/// use seo_wayfinder::config::LinkCheckConfig;
/// use seo_wayfinder::crawler::{extract_page, LinkStatusCache, LinkValidator};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let validator = LinkValidator::new(&LinkCheckConfig::default(), "ExampleBot/1.0")?;
/// let cache = LinkStatusCache::new();
/// let base_url = Url::parse("https://example.com/")?;
/// let record = extract_page("<a href=\"/about\">About</a>", &base_url, &validator, &cache).await;
/// assert_eq!(record.internal_links, vec!["https://example.com/about"]);
/// # Ok(())
/// # }
/// ```
pub async fn extract_page(
    html: &str,
    base_url: &Url,
    validator: &LinkValidator,
    cache: &LinkStatusCache,
) -> PageRecord {
    let mut record = parse_page(html, base_url);
    record.non_200_links = validator.validate(&record.links, cache).await;
    record
}

/// Parses a page without checking links (`non_200_links` is left empty)
pub fn parse_page(html: &str, base_url: &Url) -> PageRecord {
    let document = Html::parse_document(html);

    let (robots, noindex) = extract_robots(&document);
    let (links, internal_links, external_links) = extract_links(&document, base_url);
    let images = extract_images(&document, base_url);
    let missing_alt_images = images
        .iter()
        .filter(|image| image.alt.is_empty())
        .map(|image| image.src.clone())
        .collect();
    let (slug, url_parts) = split_url(base_url);

    PageRecord {
        url: base_url.to_string(),
        title: extract_title(&document),
        meta_description: meta_content(&document, "description").unwrap_or_default(),
        canonical: extract_canonical(&document),
        robots,
        noindex,
        headings: extract_headings(&document),
        links,
        internal_links,
        external_links,
        hreflang: extract_hreflang(&document, base_url),
        images,
        missing_alt_images,
        paragraphs: texts(&document, "p"),
        scripts: resolved_attrs(&document, "script[src]", "src", base_url),
        stylesheets: extract_stylesheets(&document, base_url),
        structured_data: extract_structured_data(&document, base_url),
        slug,
        url_parts,
        non_200_links: Vec::new(),
    }
}

/// Selects every element matching `css`; an invalid selector matches nothing
fn select<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(e) => {
            tracing::error!("Invalid selector '{}': {:?}", css, e);
            Vec::new()
        }
    }
}

fn text_of(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn texts(document: &Html, css: &str) -> Vec<String> {
    select(document, css).iter().map(text_of).collect()
}

fn resolved_attrs(document: &Html, css: &str, attr: &str, base_url: &Url) -> Vec<String> {
    select(document, css)
        .iter()
        .filter_map(|element| element.value().attr(attr))
        .filter_map(|value| resolve_href(value, base_url))
        .map(|url| url.to_string())
        .collect()
}

/// `<link>` elements whose space-separated `rel` contains `rel`
fn links_with_rel<'a>(document: &'a Html, rel: &str) -> Vec<ElementRef<'a>> {
    select(document, "link[rel]")
        .into_iter()
        .filter(|element| {
            element
                .value()
                .attr("rel")
                .map(|value| {
                    value
                        .split_ascii_whitespace()
                        .any(|token| token.eq_ignore_ascii_case(rel))
                })
                .unwrap_or(false)
        })
        .collect()
}

/// Trimmed `content` of the first `<meta name=...>` with the given name
fn meta_content(document: &Html, name: &str) -> Option<String> {
    select(document, "meta[name]")
        .into_iter()
        .find(|element| {
            element
                .value()
                .attr("name")
                .map(|value| value.trim().eq_ignore_ascii_case(name))
                .unwrap_or(false)
        })
        .map(|element| {
            element
                .value()
                .attr("content")
                .unwrap_or_default()
                .trim()
                .to_string()
        })
}

fn extract_title(document: &Html) -> String {
    select(document, "title")
        .first()
        .map(text_of)
        .unwrap_or_default()
}

fn extract_robots(document: &Html) -> (Option<String>, bool) {
    let robots = meta_content(document, "robots");
    let noindex = robots
        .as_deref()
        .map(|content| content.to_lowercase().contains("noindex"))
        .unwrap_or(false);
    (robots, noindex)
}

fn extract_canonical(document: &Html) -> Option<String> {
    links_with_rel(document, "canonical")
        .into_iter()
        .find_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
}

fn extract_headings(document: &Html) -> BTreeMap<String, Vec<String>> {
    HEADING_LEVELS
        .iter()
        .map(|level| (level.to_string(), texts(document, level)))
        .collect()
}

/// Every anchor href, resolved, plus the internal/external split
fn extract_links(document: &Html, base_url: &Url) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut links = Vec::new();
    let mut internal = Vec::new();
    let mut external = Vec::new();

    for element in select(document, "a[href]") {
        let Some(url) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_href(href, base_url))
        else {
            continue;
        };

        let link = url.to_string();
        if is_same_host(&url, base_url) {
            internal.push(link.clone());
        } else {
            external.push(link.clone());
        }
        links.push(link);
    }

    (links, internal, external)
}

fn extract_hreflang(document: &Html, base_url: &Url) -> BTreeMap<String, String> {
    let mut alternates = BTreeMap::new();

    for element in links_with_rel(document, "alternate") {
        let Some(lang) = element.value().attr("hreflang").map(str::trim) else {
            continue;
        };
        if lang.is_empty() {
            continue;
        }

        if let Some(url) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_href(href, base_url))
        {
            alternates.insert(lang.to_string(), url.to_string());
        }
    }

    alternates
}

fn extract_images(document: &Html, base_url: &Url) -> Vec<Image> {
    select(document, "img[src]")
        .into_iter()
        .filter_map(|element| {
            let src = resolve_href(element.value().attr("src")?, base_url)?;
            let alt = element.value().attr("alt").unwrap_or_default().trim();
            Some(Image {
                src: src.to_string(),
                alt: alt.to_string(),
            })
        })
        .collect()
}

fn extract_stylesheets(document: &Html, base_url: &Url) -> Vec<String> {
    links_with_rel(document, "stylesheet")
        .into_iter()
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_href(href, base_url))
        .map(|url| url.to_string())
        .collect()
}

fn extract_structured_data(document: &Html, base_url: &Url) -> Vec<Value> {
    let mut blocks = Vec::new();

    for element in select(document, "script[type]") {
        let is_json_ld = element
            .value()
            .attr("type")
            .map(|kind| kind.trim().eq_ignore_ascii_case("application/ld+json"))
            .unwrap_or(false);
        if !is_json_ld {
            continue;
        }

        let body = element.text().collect::<String>();
        let body = body.trim();
        if body.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(body) {
            Ok(value) => blocks.push(value),
            Err(e) => tracing::warn!("Dropping malformed JSON-LD block on {}: {}", base_url, e),
        }
    }

    blocks
}
