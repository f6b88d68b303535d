//! Data types produced by the harvester.

use serde::{Deserialize, Serialize};

/// What to search the job board for.
///
/// Only `job_type` is required; blank optional fields are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub job_type: String,
    pub discipline: Option<String>,
    pub location: Option<String>,
    pub keyword: Option<String>,
}

impl SearchQuery {
    pub fn new(job_type: impl Into<String>) -> Self {
        Self {
            job_type: job_type.into(),
            ..Default::default()
        }
    }

    pub fn with_discipline(mut self, discipline: impl Into<String>) -> Self {
        self.discipline = Some(discipline.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }
}

/// One card on a search-results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCard {
    pub title: String,
    /// Absolute URL of the listing's detail page
    pub link: String,
}

/// Everything read from one search-results page.
#[derive(Debug, Clone, Default)]
pub struct ResultsPage {
    /// Number of listing cards on the page, including ones without a usable link
    pub card_count: usize,
    pub cards: Vec<ListingCard>,
}

/// The named sections a detail page's body is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Overview,
    Responsibilities,
    Requirements,
    SkillsAndQualities,
    SalaryInfo,
    AboutCompany,
}

/// Heading keyword → section, checked in order; the first substring hit wins.
///
/// "about" precedes "about company", so an "About the company" heading lands
/// in the overview.
pub const HEADING_SECTIONS: &[(&str, Section)] = &[
    ("about", Section::Overview),
    ("overview", Section::Overview),
    ("working at", Section::Overview),
    ("responsibilities", Section::Responsibilities),
    ("duties", Section::Responsibilities),
    ("tasks", Section::Responsibilities),
    ("objectives", Section::Responsibilities),
    ("qualifications", Section::Requirements),
    ("requirements", Section::Requirements),
    ("selection criteria", Section::Requirements),
    ("skills", Section::SkillsAndQualities),
    ("talents", Section::SkillsAndQualities),
    ("salary", Section::SalaryInfo),
    ("about company", Section::AboutCompany),
    ("about atlassian", Section::AboutCompany),
    ("perks & benefits", Section::AboutCompany),
];

impl Section {
    /// Map a heading's text to a section, case-insensitively.
    pub fn from_heading(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        HEADING_SECTIONS
            .iter()
            .find(|(keyword, _)| text.contains(keyword))
            .map(|(_, section)| *section)
    }
}

/// Section texts in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sections {
    pub overview: Vec<String>,
    pub responsibilities: Vec<String>,
    pub requirements: Vec<String>,
    pub skills_and_qualities: Vec<String>,
    pub salary_info: Vec<String>,
    pub about_company: Vec<String>,
}

impl Sections {
    pub fn get(&self, section: Section) -> &[String] {
        match section {
            Section::Overview => &self.overview,
            Section::Responsibilities => &self.responsibilities,
            Section::Requirements => &self.requirements,
            Section::SkillsAndQualities => &self.skills_and_qualities,
            Section::SalaryInfo => &self.salary_info,
            Section::AboutCompany => &self.about_company,
        }
    }

    pub fn get_mut(&mut self, section: Section) -> &mut Vec<String> {
        match section {
            Section::Overview => &mut self.overview,
            Section::Responsibilities => &mut self.responsibilities,
            Section::Requirements => &mut self.requirements,
            Section::SkillsAndQualities => &mut self.skills_and_qualities,
            Section::SalaryInfo => &mut self.salary_info,
            Section::AboutCompany => &mut self.about_company,
        }
    }
}

/// A listing as extracted from its detail page, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPosting {
    pub title: String,
    pub ai_summary: Option<String>,
    pub full_text: String,
    /// Display string straight from the page
    pub posted_date: String,
    /// e.g. "Closing in 12 days"
    pub closing_text: String,
    pub sections: Sections,
    pub link: String,
}
