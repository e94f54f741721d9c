// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

use crate::models::QueryParams;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Append query parameters to a URL, keeping any it already has.
pub fn with_params(base: &Url, params: &QueryParams) -> Url {
    let mut url = base.clone();
    if !params.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    url
}

/// Last non-empty path segment of a URL, if any.
///
/// # Examples
/// ```
/// use imgharvest::utils::url::file_name_from_url;
///
/// assert_eq!(
///     file_name_from_url("https://example.com/img/cat.jpg?size=large"),
///     Some("cat.jpg".to_string())
/// );
/// ```
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(|segment| segment.to_string())
}
