//! Sitemap resolution against mock servers

use crate::{create_test_config, mount_get, mount_get_expect, sitemap_index, urlset};
use seo_wayfinder::crawler::{Fetcher, SitemapResolver};
use seo_wayfinder::CrawlInput;
use std::collections::BTreeSet;
use std::io::Write;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn remote(uri: &str) -> CrawlInput {
    CrawlInput::Remote(Url::parse(uri).unwrap())
}

#[tokio::test]
async fn test_index_with_two_urlsets_yields_four_pages() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/sitemap.xml",
        sitemap_index(&[
            format!("{}/sitemap-posts.xml", base),
            format!("{}/sitemap-pages.xml", base),
        ]),
    )
    .await;
    mount_get(
        &server,
        "/sitemap-posts.xml",
        urlset(&[format!("{}/posts/1", base), format!("{}/posts/2", base)]),
    )
    .await;
    mount_get(
        &server,
        "/sitemap-pages.xml",
        urlset(&[format!("{}/", base), format!("{}/about", base)]),
    )
    .await;

    let fetcher = Fetcher::new(&create_test_config().fetcher).unwrap();
    let mut resolver = SitemapResolver::new(&fetcher);
    let pages = resolver
        .resolve(&remote(&format!("{}/sitemap.xml", base)))
        .await
        .unwrap();

    let expected: BTreeSet<String> = [
        format!("{}/posts/1", base),
        format!("{}/posts/2", base),
        format!("{}/", base),
        format!("{}/about", base),
    ]
    .into_iter()
    .collect();
    assert_eq!(pages, expected);
    assert_eq!(resolver.visited_count(), 3);
    assert!(resolver.take_skipped().is_empty());
}

#[tokio::test]
async fn test_cycle_terminates_and_fetches_each_sitemap_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    // a -> b -> a, and b also lists a urlset
    mount_get_expect(
        &server,
        "/a.xml",
        sitemap_index(&[format!("{}/b.xml", base)]),
        1,
    )
    .await;
    mount_get_expect(
        &server,
        "/b.xml",
        sitemap_index(&[format!("{}/a.xml", base), format!("{}/leaf.xml", base)]),
        1,
    )
    .await;
    mount_get_expect(
        &server,
        "/leaf.xml",
        urlset(&[format!("{}/only-page", base)]),
        1,
    )
    .await;

    let fetcher = Fetcher::new(&create_test_config().fetcher).unwrap();
    let mut resolver = SitemapResolver::new(&fetcher);
    let pages = resolver
        .resolve(&remote(&format!("{}/a.xml", base)))
        .await
        .unwrap();

    assert_eq!(pages.len(), 1);
    assert!(pages.contains(&format!("{}/only-page", base)));
    assert_eq!(resolver.visited_count(), 3);
}

#[tokio::test]
async fn test_duplicate_leaf_urls_are_suppressed() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/index.xml",
        sitemap_index(&[format!("{}/one.xml", base), format!("{}/two.xml", base)]),
    )
    .await;
    mount_get(
        &server,
        "/one.xml",
        urlset(&[format!("{}/shared", base), format!("{}/a", base)]),
    )
    .await;
    mount_get(
        &server,
        "/two.xml",
        urlset(&[format!("{}/shared", base), format!("{}/b", base)]),
    )
    .await;

    let fetcher = Fetcher::new(&create_test_config().fetcher).unwrap();
    let mut resolver = SitemapResolver::new(&fetcher);
    let pages = resolver
        .resolve(&remote(&format!("{}/index.xml", base)))
        .await
        .unwrap();

    assert_eq!(pages.len(), 3);
}

#[tokio::test]
async fn test_broken_nested_sitemap_does_not_abort_siblings() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/index.xml",
        sitemap_index(&[
            format!("{}/good.xml", base),
            format!("{}/malformed.xml", base),
            format!("{}/missing.xml", base),
        ]),
    )
    .await;
    mount_get(
        &server,
        "/good.xml",
        urlset(&[format!("{}/good-page", base)]),
    )
    .await;
    mount_get(
        &server,
        "/malformed.xml",
        "<urlset><url><loc>oops</url>".to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(&create_test_config().fetcher).unwrap();
    let mut resolver = SitemapResolver::new(&fetcher);
    let pages = resolver
        .resolve(&remote(&format!("{}/index.xml", base)))
        .await
        .unwrap();

    assert_eq!(pages.len(), 1);
    assert!(pages.contains(&format!("{}/good-page", base)));

    let mut skipped: Vec<String> = resolver
        .take_skipped()
        .into_iter()
        .map(|s| s.url)
        .collect();
    skipped.sort();
    assert_eq!(
        skipped,
        vec![
            format!("{}/malformed.xml", base),
            format!("{}/missing.xml", base)
        ]
    );
}

#[tokio::test]
async fn test_relative_locs_resolve_against_sitemap_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/maps/index.xml",
        sitemap_index(&["pages.xml".to_string()]),
    )
    .await;
    mount_get(
        &server,
        "/maps/pages.xml",
        urlset(&["/contact".to_string()]),
    )
    .await;

    let fetcher = Fetcher::new(&create_test_config().fetcher).unwrap();
    let mut resolver = SitemapResolver::new(&fetcher);
    let pages = resolver
        .resolve(&remote(&format!("{}/maps/index.xml", base)))
        .await
        .unwrap();

    assert_eq!(
        pages.into_iter().collect::<Vec<_>>(),
        vec![format!("{}/contact", base)]
    );
}

#[tokio::test]
async fn test_local_sitemap_file_with_remote_children() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/remote.xml",
        urlset(&[format!("{}/x", base), format!("{}/y", base)]),
    )
    .await;

    let mut file = tempfile::Builder::new().suffix(".xml").tempfile().unwrap();
    file.write_all(sitemap_index(&[format!("{}/remote.xml", base)]).as_bytes())
        .unwrap();

    let fetcher = Fetcher::new(&create_test_config().fetcher).unwrap();
    let mut resolver = SitemapResolver::new(&fetcher);
    let input = CrawlInput::parse(file.path().to_str().unwrap()).unwrap();
    let pages = resolver.resolve(&input).await.unwrap();

    assert_eq!(pages.len(), 2);
}

#[tokio::test]
async fn test_resolving_same_input_twice_in_one_run() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get_expect(
        &server,
        "/sitemap.xml",
        urlset(&[format!("{}/p", base)]),
        1,
    )
    .await;

    let fetcher = Fetcher::new(&create_test_config().fetcher).unwrap();
    let mut resolver = SitemapResolver::new(&fetcher);
    let input = remote(&format!("{}/sitemap.xml", base));

    assert_eq!(resolver.resolve(&input).await.unwrap().len(), 1);
    assert!(resolver.resolve(&input).await.unwrap().is_empty());
}
