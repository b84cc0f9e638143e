use serde::{Deserialize, Serialize};
use url::Url;

/// The non-path pieces of a page URL, kept verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlParts {
    /// `;params` on the last path segment, without the leading `;`
    pub params: String,

    /// Query string without the leading `?`
    pub query: String,

    /// Fragment without the leading `#`
    pub fragment: String,
}

/// Splits a page URL into its slug and remaining parts
///
/// The slug is the URL path with path parameters removed and exactly one
/// leading slash. Path parameters follow the classic `path;params` form and are
/// only recognized on the last segment.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seo_wayfinder::url::split_url;
///
/// let url = Url::parse("https://example.com/shop/item;v=2?id=7#reviews").unwrap();
/// let (slug, parts) = split_url(&url);
/// assert_eq!(slug, "/shop/item");
/// assert_eq!(parts.params, "v=2");
/// assert_eq!(parts.query, "id=7");
/// assert_eq!(parts.fragment, "reviews");
/// ```
pub fn split_url(url: &Url) -> (String, UrlParts) {
    let path = url.path();
    let last_segment_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);

    let (path, params) = match path[last_segment_start..].find(';') {
        Some(offset) => {
            let split_at = last_segment_start + offset;
            (&path[..split_at], &path[split_at + 1..])
        }
        None => (path, ""),
    };

    let slug = format!("/{}", path.trim_start_matches('/'));

    let parts = UrlParts {
        params: params.to_string(),
        query: url.query().unwrap_or_default().to_string(),
        fragment: url.fragment().unwrap_or_default().to_string(),
    };

    (slug, parts)
}
