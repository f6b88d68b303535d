//! Resume-driven posting suggestions

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::domains::postings::data::PostingData;
use crate::domains::postings::matching::{matches, PostingFilters};
use crate::kernel::ServerDeps;

pub const MAX_SUGGESTIONS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestions {
    /// Search terms pulled from the resume, after cleanup
    pub keywords: Vec<String>,
    pub postings: Vec<PostingData>,
}

/// Suggest postings for a resume.
///
/// Each stored posting is suggested at most once, when it matches any of the
/// resume's keywords at the search threshold. Stops at [`MAX_SUGGESTIONS`].
/// Matching runs on the blocking pool.
pub async fn suggest_postings(resume_text: &str, deps: &ServerDeps) -> Result<Suggestions> {
    let keywords: Vec<String> = deps
        .keyword_extractor
        .extract_keywords(resume_text)
        .await
        .context("keyword extraction failed")?
        .iter()
        .map(|keyword| clean_keyword(keyword))
        .filter(|keyword| !keyword.is_empty())
        .collect();
    debug!(keywords = ?keywords, "extracted resume keywords");

    if keywords.is_empty() {
        return Ok(Suggestions {
            keywords,
            postings: Vec::new(),
        });
    }

    let filters: Vec<PostingFilters> = keywords.iter().map(PostingFilters::search).collect();
    let threshold = deps.matching.search_threshold;

    let stored = deps.postings.list_all().await?;
    let postings = tokio::task::spawn_blocking(move || {
        stored
            .iter()
            .filter(|posting| filters.iter().any(|f| matches(posting, f, threshold)))
            .take(MAX_SUGGESTIONS)
            .map(PostingData::from)
            .collect::<Vec<_>>()
    })
    .await
    .context("posting suggestion task failed")?;

    Ok(Suggestions { keywords, postings })
}

fn clean_keyword(keyword: &str) -> String {
    keyword
        .trim()
        .trim_matches(|c: char| c.is_ascii_punctuation())
        .to_string()
}
