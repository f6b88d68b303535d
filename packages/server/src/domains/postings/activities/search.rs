//! Filtered, paginated posting search

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domains::postings::data::PostingData;
use crate::domains::postings::matching::{matches, PostingFilters};
use crate::kernel::ServerDeps;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// One page of matching postings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub postings: Vec<PostingData>,
    /// Matches across all pages
    pub total: usize,
    pub has_more: bool,
}

/// Search stored postings.
///
/// Free-text search uses the looser search threshold; browsing by facets
/// alone uses the stricter facet threshold. `limit` defaults to
/// [`DEFAULT_PAGE_SIZE`] and is capped at [`MAX_PAGE_SIZE`].
///
/// Matching is CPU-bound and runs on the blocking pool.
pub async fn search_postings(
    filters: &PostingFilters,
    offset: usize,
    limit: Option<usize>,
    deps: &ServerDeps,
) -> Result<SearchPage> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let threshold = if filters.search.trim().is_empty() {
        deps.matching.threshold
    } else {
        deps.matching.search_threshold
    };

    let stored = deps.postings.list_all().await?;
    let owned_filters = filters.clone();
    let matching: Vec<_> = tokio::task::spawn_blocking(move || {
        stored
            .into_iter()
            .filter(|posting| matches(posting, &owned_filters, threshold))
            .collect::<Vec<_>>()
    })
    .await
    .context("posting search task failed")?;

    let total = matching.len();
    let postings = matching
        .iter()
        .skip(offset)
        .take(limit)
        .map(PostingData::from)
        .collect();

    Ok(SearchPage {
        postings,
        total,
        has_more: offset.saturating_add(limit) < total,
    })
}
