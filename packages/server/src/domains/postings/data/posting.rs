use serde::{Deserialize, Serialize};

use crate::domains::postings::models::Posting;

/// Display format of `closingAt`, e.g. "14 Feb 2025"
pub const CLOSING_AT_FORMAT: &str = "%d %b %Y";

/// API representation of a posting.
///
/// Shared by the live stream, search, closing-soon and suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingData {
    pub title: String,
    pub company: String,
    pub posted_date: String,
    pub closing_text: String,
    pub closing_at: Option<String>,
    pub ai_summary: Option<String>,
    pub link: String,
    pub tags: PostingTags,
}

/// Facet tags the posting was scraped under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingTags {
    pub location: Option<String>,
    pub job_type: String,
    pub category: Option<String>,
}

impl From<&Posting> for PostingData {
    fn from(posting: &Posting) -> Self {
        Self {
            title: posting.title.clone(),
            company: posting.company().to_string(),
            posted_date: posting.posted_date.clone(),
            closing_text: posting.closing_text.clone(),
            closing_at: posting
                .closing_at
                .map(|at| at.format(CLOSING_AT_FORMAT).to_string()),
            ai_summary: posting.ai_summary.clone(),
            link: posting.link.clone(),
            tags: PostingTags {
                location: posting.location.clone(),
                job_type: posting.job_type.clone(),
                category: posting.discipline.clone(),
            },
        }
    }
}

impl From<Posting> for PostingData {
    fn from(posting: Posting) -> Self {
        Self::from(&posting)
    }
}
