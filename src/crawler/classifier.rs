//! XML-versus-HTML dispatch
//!
//! This is a best-effort sniffing rule, not a content-type authority: servers
//! mislabel content often enough that the body itself decides.

/// Returns true if fetched content should be treated as a sitemap/XML document
///
/// True when the URL ends in `.xml`, or when the content (ignoring a byte order
/// mark and leading whitespace) starts with an XML declaration or a
/// `<sitemapindex` root tag.
///
/// # Examples
///
/// ```
/// use seo_wayfinder::crawler::is_xml;
///
/// assert!(is_xml("", "https://example.com/sitemap.xml"));
/// assert!(is_xml("\n  <?xml version=\"1.0\"?><urlset/>", "https://example.com/map"));
/// assert!(!is_xml("<!DOCTYPE html><html></html>", "https://example.com/"));
/// ```
pub fn is_xml(content: &str, url: &str) -> bool {
    if url.to_ascii_lowercase().ends_with(".xml") {
        return true;
    }

    let head = content.trim_start_matches('\u{feff}').trim_start();
    head.starts_with("<?xml") || head.starts_with("<sitemapindex")
}
