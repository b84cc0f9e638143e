use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// URLs without a host (`mailto:`, `data:`) return None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seo_wayfinder::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true when `link` points at the same host as `base`
///
/// Hosts must match exactly; `www.example.com` and `example.com` are different
/// hosts. A link without a host is never internal.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seo_wayfinder::url::is_same_host;
///
/// let base = Url::parse("https://example.com/").unwrap();
/// assert!(is_same_host(&Url::parse("https://example.com/about").unwrap(), &base));
/// assert!(!is_same_host(&Url::parse("https://blog.example.com/").unwrap(), &base));
/// ```
pub fn is_same_host(link: &Url, base: &Url) -> bool {
    match (link.host_str(), base.host_str()) {
        (Some(link_host), Some(base_host)) => link_host.eq_ignore_ascii_case(base_host),
        _ => false,
    }
}
