//! Integration tests for SEO Wayfinder
//!
//! These tests use wiremock to stand up mock sites (sitemaps, pages, and link
//! targets) and run the crawl pipeline against them end to end.

mod crawl_tests;
mod sitemap_tests;

use seo_wayfinder::config::Config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration with pacing disabled and short timeouts
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.fetcher.user_agent = "WayfinderTest/1.0".to_string();
    config.fetcher.pacing_ms = 0;
    config.fetcher.timeout_secs = 5;
    config.links.timeout_secs = 5;
    config
}

pub fn sitemap_index(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("  <sitemap><loc>{}</loc></sitemap>\n", loc))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</sitemapindex>",
        entries
    )
}

pub fn urlset(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("  <url><loc>{}</loc></url>\n", loc))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</urlset>",
        entries
    )
}

/// Mounts a GET route returning `body` with status 200
pub async fn mount_get(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts a GET route that must be requested exactly `times` times
pub async fn mount_get_expect(server: &MockServer, route: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(times)
        .mount(server)
        .await;
}

/// A small HTML page with a title and optional extra body markup
pub fn html_page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    )
}
