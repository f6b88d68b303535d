//! Search URL construction.
//!
//! Pattern: `<base>/<job_type>/<discipline>/<location>/?title=<keyword>`, with
//! blank segments left out entirely.

use url::form_urlencoded;
use url::Url;

use crate::types::SearchQuery;

/// Build the first results page URL for a query.
pub fn build_search_url(base: &Url, query: &SearchQuery) -> String {
    let segments: Vec<&str> = [
        Some(query.job_type.as_str()),
        query.discipline.as_deref(),
        query.location.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(|s| s.trim().trim_matches('/'))
    .filter(|s| !s.is_empty())
    .collect();

    let root = base.as_str().trim_end_matches('/');
    let mut url = if segments.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}/", root, segments.join("/"))
    };

    if let Some(keyword) = query.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        let encoded: String = form_urlencoded::byte_serialize(keyword.as_bytes()).collect();
        url.push_str("?title=");
        url.push_str(&encoded);
    }

    url
}

/// Append `page=N`, joining with `&` when a query string is already present.
pub fn with_page_param(url: &str, page: u32) -> String {
    let joiner = if url.contains('?') { '&' } else { '?' };
    format!("{}{}page={}", url, joiner, page)
}
