//! Posting filter: free-text query plus the three facet filters.
//!
//! A posting matches when every non-empty facet occurs in (or is similar
//! enough to) its aggregated text, and the query, if any, matches at least one
//! of its individual fields.

use harvester::Section;
use serde::Deserialize;

use crate::common::utils::is_fuzzy_match;
use crate::domains::postings::models::Posting;

const ALL_SECTIONS: [Section; 6] = [
    Section::Overview,
    Section::Responsibilities,
    Section::Requirements,
    Section::SkillsAndQualities,
    Section::SalaryInfo,
    Section::AboutCompany,
];

/// Longest search or facet value accepted, in characters
pub const MAX_FILTER_LEN: usize = 200;

/// Search box plus facet dropdowns. Blank values are no filter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PostingFilters {
    pub search: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub category: String,
}

impl PostingFilters {
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            search: query.into(),
            ..Default::default()
        }
    }

    /// Query parameter name of the first value longer than [`MAX_FILTER_LEN`]
    pub fn oversized_field(&self) -> Option<&'static str> {
        [
            ("search", &self.search),
            ("location", &self.location),
            ("type", &self.job_type),
            ("category", &self.category),
        ]
        .into_iter()
        .find(|(_, value)| value.chars().count() > MAX_FILTER_LEN)
        .map(|(name, _)| name)
    }

    pub fn is_empty(&self) -> bool {
        [&self.search, &self.location, &self.job_type, &self.category]
            .iter()
            .all(|value| value.trim().is_empty())
    }
}

/// Whether `posting` passes `filters`. Pure: same inputs, same answer.
pub fn matches(posting: &Posting, filters: &PostingFilters, threshold: f64) -> bool {
    if filters.is_empty() {
        return true;
    }

    let aggregated = aggregated_text(posting);
    let facets = [&filters.location, &filters.job_type, &filters.category];
    let facets_match = facets.iter().all(|facet| {
        let facet = facet.trim();
        facet.is_empty() || is_fuzzy_match(facet, &aggregated, threshold)
    });
    if !facets_match {
        return false;
    }

    let query = filters.search.trim();
    query.is_empty() || query_matches(posting, query, threshold)
}

fn query_matches(posting: &Posting, query: &str, threshold: f64) -> bool {
    let mut fields: Vec<String> = vec![
        posting.title.clone(),
        posting.company().to_string(),
        posting.ai_summary.clone().unwrap_or_default(),
    ];
    fields.extend(
        ALL_SECTIONS
            .iter()
            .map(|section| posting.sections.get(*section).join(" ")),
    );
    fields.push(posting.full_text.clone());

    fields
        .iter()
        .filter(|field| !field.is_empty())
        .any(|field| is_fuzzy_match(query, field, threshold))
}

/// Full text followed by the facet tags the posting was scraped under.
fn aggregated_text(posting: &Posting) -> String {
    let mut text = posting.full_text.clone();
    for tag in [
        Some(&posting.job_type),
        posting.location.as_ref(),
        posting.discipline.as_ref(),
    ]
    .into_iter()
    .flatten()
    {
        text.push(' ');
        text.push_str(tag);
    }
    text
}
