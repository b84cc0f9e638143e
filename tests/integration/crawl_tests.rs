//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock sites and run the full crawl
//! cycle end-to-end through the coordinator.

use crate::{create_test_config, html_page, mount_get, mount_get_expect, sitemap_index, urlset};
use async_trait::async_trait;
use seo_wayfinder::config::DEFAULT_REFERER;
use seo_wayfinder::crawler::{Coordinator, Renderer};
use seo_wayfinder::storage::{SqliteStorage, Storage};
use seo_wayfinder::WayfinderError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_head(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_from_sitemap_index() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/sitemap.xml",
        sitemap_index(&[format!("{}/s1.xml", base), format!("{}/s2.xml", base)]),
    )
    .await;
    mount_get(
        &server,
        "/s1.xml",
        urlset(&[format!("{}/a", base), format!("{}/b", base)]),
    )
    .await;
    mount_get(
        &server,
        "/s2.xml",
        urlset(&[format!("{}/c", base), format!("{}/d", base)]),
    )
    .await;
    for page in ["a", "b", "c", "d"] {
        mount_get_expect(
            &server,
            &format!("/{}", page),
            html_page(&format!("Page {}", page.to_uppercase()), "<h1>Hello</h1>"),
            1,
        )
        .await;
    }

    let coordinator = Coordinator::new_unchecked(create_test_config()).unwrap();
    let result = coordinator
        .run(&format!("{}/sitemap.xml", base))
        .await
        .unwrap();

    assert_eq!(result.len(), 4);
    assert!(result.skipped.is_empty());

    let page_c = result.get(&format!("{}/c", base)).unwrap();
    assert_eq!(page_c.title, "Page C");
    assert_eq!(page_c.headings["h1"], vec!["Hello"]);
    assert_eq!(page_c.slug, "/c");
}

#[tokio::test]
async fn test_requests_carry_configured_user_agent_and_referer() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .and(header("user-agent", "WayfinderTest/1.0"))
        .and(header("referer", DEFAULT_REFERER))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(urlset(&[format!("{}/landing", base)])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .and(header("user-agent", "WayfinderTest/1.0"))
        .and(header("referer", DEFAULT_REFERER))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("Landing", r#"<a href="/pricing">Pricing</a>"#)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/pricing"))
        .and(header("user-agent", "WayfinderTest/1.0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = Coordinator::new_unchecked(create_test_config()).unwrap();
    let result = coordinator
        .run(&format!("{}/sitemap.xml", base))
        .await
        .unwrap();

    assert!(result.skipped.is_empty());
    let landing = result.get(&format!("{}/landing", base)).unwrap();
    assert_eq!(landing.title, "Landing");
    assert!(landing.non_200_links.is_empty());
}

#[tokio::test]
async fn test_relative_about_link_is_internal_and_healthy() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/",
        html_page("Home", r#"<a href="/about">About us</a>"#),
    )
    .await;
    mount_head(&server, "/about", 200).await;

    let coordinator = Coordinator::new_unchecked(create_test_config()).unwrap();
    let result = coordinator.run(&format!("{}/", base)).await.unwrap();

    let home = result.get(&format!("{}/", base)).unwrap();
    let about = format!("{}/about", base);
    assert_eq!(home.links, vec![about.clone()]);
    assert_eq!(home.internal_links, vec![about]);
    assert!(home.external_links.is_empty());
    assert!(home.non_200_links.is_empty());
}

#[tokio::test]
async fn test_link_returning_404_is_non_200() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/page",
        html_page("Page", r#"<a href="/gone">Gone</a>"#),
    )
    .await;
    mount_head(&server, "/gone", 404).await;

    let coordinator = Coordinator::new_unchecked(create_test_config()).unwrap();
    let result = coordinator.run(&format!("{}/page", base)).await.unwrap();

    let gone = format!("{}/gone", base);
    let page = result.get(&format!("{}/page", base)).unwrap();
    assert_eq!(page.links, vec![gone.clone()]);
    assert_eq!(page.non_200_links, vec![gone]);
}

#[tokio::test]
async fn test_malformed_json_ld_is_dropped() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/article",
        html_page(
            "Article",
            r#"<script type="application/ld+json">{bad}</script>
               <script type="application/ld+json">{"@context": "https://schema.org", "@type": "Article"}</script>
               <p>Body text</p>"#,
        ),
    )
    .await;

    let coordinator = Coordinator::new_unchecked(create_test_config()).unwrap();
    let result = coordinator
        .run(&format!("{}/article", base))
        .await
        .unwrap();

    let page = result.get(&format!("{}/article", base)).unwrap();
    assert_eq!(page.title, "Article");
    assert_eq!(page.structured_data.len(), 1);
    assert_eq!(page.structured_data[0]["@type"], "Article");
    assert_eq!(page.paragraphs, vec!["Body text"]);
}

#[tokio::test]
async fn test_failed_pages_are_skipped_not_fabricated() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/sitemap.xml",
        urlset(&[format!("{}/ok", base), format!("{}/broken", base)]),
    )
    .await;
    mount_get(&server, "/ok", html_page("Ok", "")).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let coordinator = Coordinator::new_unchecked(create_test_config()).unwrap();
    let result = coordinator
        .run(&format!("{}/sitemap.xml", base))
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert!(result.get(&format!("{}/broken", base)).is_none());
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].url, format!("{}/broken", base));
    assert!(result.skipped[0].reason.contains("500"));
}

#[tokio::test]
async fn test_page_that_is_a_sitemap_is_rerouted() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/sitemap.xml",
        urlset(&[format!("{}/feed", base), format!("{}/home", base)]),
    )
    .await;
    // Served without an .xml extension, recognized by its declaration
    mount_get_expect(
        &server,
        "/feed",
        urlset(&[format!("{}/from-feed", base), format!("{}/home", base)]),
        1,
    )
    .await;
    mount_get_expect(&server, "/home", html_page("Home", ""), 1).await;
    mount_get_expect(&server, "/from-feed", html_page("From feed", ""), 1).await;

    let coordinator = Coordinator::new_unchecked(create_test_config()).unwrap();
    let result = coordinator
        .run(&format!("{}/sitemap.xml", base))
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    assert!(result.get(&format!("{}/feed", base)).is_none());
    assert_eq!(
        result.get(&format!("{}/from-feed", base)).unwrap().title,
        "From feed"
    );
}

#[tokio::test]
async fn test_invalid_input_aborts() {
    let coordinator = Coordinator::new_unchecked(create_test_config()).unwrap();

    for input in ["", "not-a-url", "mailto:someone@example.com", "./missing.xml"] {
        let result = coordinator.run(input).await;
        assert!(
            matches!(result, Err(WayfinderError::InvalidInput(_))),
            "{:?} should be invalid",
            input
        );
    }
}

#[tokio::test]
async fn test_run_many_shares_link_cache() {
    let server = MockServer::start().await;
    let base = server.uri();

    let shared_link = r#"<a href="/shared">Shared</a>"#;
    mount_get(&server, "/one", html_page("One", shared_link)).await;
    mount_get(&server, "/two", html_page("Two", shared_link)).await;
    Mock::given(method("HEAD"))
        .and(path("/shared"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = Coordinator::new_unchecked(create_test_config()).unwrap();
    let inputs = vec![
        format!("{}/one", base),
        "definitely not an input".to_string(),
        format!("{}/two", base),
    ];
    let result = coordinator.run_many(&inputs).await.unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(coordinator.validator().checks_issued(), 1);
}

struct FixedRenderer {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Renderer for FixedRenderer {
    async fn render(&self, url: &Url) -> Result<String, WayfinderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(html_page(&format!("Rendered {}", url.path()), ""))
    }
}

struct FailingRenderer;

#[async_trait]
impl Renderer for FailingRenderer {
    async fn render(&self, url: &Url) -> Result<String, WayfinderError> {
        Err(WayfinderError::Render {
            url: url.to_string(),
            message: "browser crashed".to_string(),
        })
    }
}

#[tokio::test]
async fn test_renderer_used_for_html_but_not_xml() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/sitemap.xml",
        urlset(&[format!("{}/app", base)]),
    )
    .await;
    mount_get(&server, "/app", html_page("Shell", "<div id=\"root\"></div>")).await;

    let calls = Arc::new(AtomicUsize::new(0));
    let coordinator = Coordinator::new_unchecked(create_test_config())
        .unwrap()
        .with_renderer(FixedRenderer {
            calls: Arc::clone(&calls),
        });

    let result = coordinator
        .run(&format!("{}/sitemap.xml", base))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        result.get(&format!("{}/app", base)).unwrap().title,
        "Rendered /app"
    );
}

#[tokio::test]
async fn test_render_failure_skips_only_that_page() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(&server, "/app", html_page("Shell", "")).await;

    let coordinator = Coordinator::new_unchecked(create_test_config())
        .unwrap()
        .with_renderer(FailingRenderer);

    let result = coordinator.run(&format!("{}/app", base)).await.unwrap();

    assert!(result.is_empty());
    assert_eq!(result.skipped.len(), 1);
    assert!(result.skipped[0].reason.contains("browser crashed"));
}

#[tokio::test]
async fn test_crawl_result_saved_to_storage() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/sitemap.xml",
        urlset(&[format!("{}/x", base), format!("{}/y", base)]),
    )
    .await;
    mount_get(&server, "/x", html_page("X", "")).await;
    mount_get(&server, "/y", html_page("Y", "")).await;

    let coordinator = Coordinator::new_unchecked(create_test_config()).unwrap();
    let result = coordinator
        .run(&format!("{}/sitemap.xml", base))
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::new(&dir.path().join("test.db")).unwrap();
    assert_eq!(storage.save_result("mock-site", &result).unwrap(), 2);

    let pages = storage.fetch_pages("mock-site").unwrap();
    let titles: Vec<_> = pages.iter().map(|p| p.record.title.as_str()).collect();
    assert_eq!(titles, vec!["X", "Y"]);
}
