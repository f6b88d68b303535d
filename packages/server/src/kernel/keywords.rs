//! Dictionary-based keyword extraction for resume text.

use anyhow::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use super::BaseKeywordExtractor;

pub const MAX_KEYWORDS: usize = 10;

/// Skills looked for in a resume, in reporting order.
pub const COMMON_SKILLS: &[&str] = &[
    // Programming languages
    "python", "java", "javascript", "c++", "c#", "ruby", "php", "swift", "kotlin", "go", "rust",
    // Web
    "html", "css", "react", "angular", "vue", "node.js", "express", "django", "flask", "spring",
    // Databases
    "sql", "mysql", "postgresql", "mongodb", "firebase", "oracle", "nosql", "redis",
    // Cloud and ops
    "aws", "azure", "gcp", "cloud", "docker", "kubernetes", "terraform", "devops",
    // Data
    "machine learning", "data analysis", "tensorflow", "pytorch", "pandas", "numpy",
    "data science", "statistics", "r", "tableau", "power bi", "data visualization", "big data",
    "hadoop", "spark",
    // Soft skills
    "communication", "teamwork", "leadership", "problem solving", "critical thinking",
    "time management", "creativity", "adaptability", "project management", "agile", "scrum",
    // Design
    "ui", "ux", "user interface", "user experience", "figma", "sketch", "adobe", "photoshop",
    "illustrator", "xd", "indesign", "graphic design",
    // Business
    "marketing", "sales", "business analysis", "product management", "strategy", "operations",
];

lazy_static! {
    // Skills like "c++" end in non-word characters, so `\b` cannot delimit them
    static ref SKILL_PATTERNS: Vec<(&'static str, Regex)> = COMMON_SKILLS
        .iter()
        .map(|skill| {
            let pattern = format!(r"(?:^|[^\w]){}(?:[^\w]|$)", regex::escape(skill));
            (*skill, Regex::new(&pattern).unwrap())
        })
        .collect();
}

/// Finds known skills in free text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillKeywordExtractor;

impl SkillKeywordExtractor {
    pub fn extract(text: &str) -> Vec<String> {
        let text = text.to_lowercase();
        SKILL_PATTERNS
            .iter()
            .filter(|(_, pattern)| pattern.is_match(&text))
            .map(|(skill, _)| skill.to_string())
            .take(MAX_KEYWORDS)
            .collect()
    }
}

#[async_trait]
impl BaseKeywordExtractor for SkillKeywordExtractor {
    async fn extract_keywords(&self, text: &str) -> Result<Vec<String>> {
        Ok(Self::extract(text))
    }
}
