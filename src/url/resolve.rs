use url::Url;

/// Resolves an attribute value (href, src) against a base URL
///
/// Returns None for blank values and for values that cannot be joined onto the
/// base. Non-HTTP schemes (`mailto:`, `tel:`) are kept: they are still links on
/// the page, they just never get a status check.
pub fn resolve_href(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    match base_url.join(href) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("Cannot resolve '{}' against {}: {}", href, base_url, e);
            None
        }
    }
}

/// Returns true if `link` parses as an absolute `http` or `https` URL with a host
pub fn is_http_link(link: &str) -> bool {
    match Url::parse(link) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}
