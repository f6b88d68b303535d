use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use harvester::Sections;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use typed_builder::TypedBuilder;

use crate::common::{MemberId, PostingId};

/// Label stored in `source` for everything the harvester brings in
pub const SOURCE_GRADCONNECTION: &str = "GradConnection";

/// Scope of a scrape run. A new run replaces every posting of its scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeKey {
    pub owner_id: MemberId,
    pub job_type: String,
    pub location: Option<String>,
    pub discipline: Option<String>,
}

impl ScopeKey {
    pub fn new(
        owner_id: MemberId,
        job_type: impl Into<String>,
        location: Option<String>,
        discipline: Option<String>,
    ) -> Self {
        Self {
            owner_id,
            job_type: job_type.into(),
            location,
            discipline,
        }
    }
}

/// A job posting persisted from a scrape run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Posting {
    #[builder(default = PostingId::new())]
    pub id: PostingId,
    pub owner_id: MemberId,

    // Scope key, doubling as the facet tags (discipline is the "category" tag)
    pub job_type: String,
    #[builder(default)]
    pub location: Option<String>,
    #[builder(default)]
    pub discipline: Option<String>,

    // Content
    pub title: String,
    pub posted_date: String,
    pub closing_text: String,
    #[builder(default)]
    pub closing_at: Option<DateTime<Utc>>,
    #[builder(default)]
    pub ai_summary: Option<String>,
    #[builder(default)]
    pub sections: Sections,
    pub full_text: String,
    pub link: String,
    #[builder(default = SOURCE_GRADCONNECTION.to_string())]
    pub source: String,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

impl Posting {
    /// Best guess at the employer: the first about-company entry
    pub fn company(&self) -> &str {
        self.sections
            .about_company
            .first()
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn scope(&self) -> ScopeKey {
        ScopeKey::new(
            self.owner_id,
            self.job_type.clone(),
            self.location.clone(),
            self.discipline.clone(),
        )
    }

    pub fn in_scope(&self, scope: &ScopeKey) -> bool {
        self.owner_id == scope.owner_id
            && self.job_type == scope.job_type
            && self.location == scope.location
            && self.discipline == scope.discipline
    }
}

// =============================================================================
// Row mapping
// =============================================================================

/// Sections are JSONB; anything that is not an array of strings reads as empty.
#[derive(Debug, sqlx::FromRow)]
struct PostingRow {
    id: PostingId,
    owner_id: MemberId,
    job_type: String,
    location: Option<String>,
    discipline: Option<String>,
    title: String,
    posted_date: String,
    closing_text: String,
    closing_at: Option<DateTime<Utc>>,
    ai_summary: Option<String>,
    overview: serde_json::Value,
    responsibilities: serde_json::Value,
    requirements: serde_json::Value,
    skills_and_qualities: serde_json::Value,
    salary_info: serde_json::Value,
    about_company: serde_json::Value,
    full_text: String,
    link: String,
    source: String,
    created_at: DateTime<Utc>,
}

fn section_from_json(value: serde_json::Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

fn section_to_json(section: &[String]) -> serde_json::Value {
    serde_json::Value::from(section.to_vec())
}

impl From<PostingRow> for Posting {
    fn from(row: PostingRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            job_type: row.job_type,
            location: row.location,
            discipline: row.discipline,
            title: row.title,
            posted_date: row.posted_date,
            closing_text: row.closing_text,
            closing_at: row.closing_at,
            ai_summary: row.ai_summary,
            sections: Sections {
                overview: section_from_json(row.overview),
                responsibilities: section_from_json(row.responsibilities),
                requirements: section_from_json(row.requirements),
                skills_and_qualities: section_from_json(row.skills_and_qualities),
                salary_info: section_from_json(row.salary_info),
                about_company: section_from_json(row.about_company),
            },
            full_text: row.full_text,
            link: row.link,
            source: row.source,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

impl Posting {
    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        let row = sqlx::query_as::<_, PostingRow>(
            r#"
            INSERT INTO postings (
                id, owner_id, job_type, location, discipline,
                title, posted_date, closing_text, closing_at, ai_summary,
                overview, responsibilities, requirements, skills_and_qualities,
                salary_info, about_company,
                full_text, link, source, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.owner_id)
        .bind(&self.job_type)
        .bind(&self.location)
        .bind(&self.discipline)
        .bind(&self.title)
        .bind(&self.posted_date)
        .bind(&self.closing_text)
        .bind(self.closing_at)
        .bind(&self.ai_summary)
        .bind(section_to_json(&self.sections.overview))
        .bind(section_to_json(&self.sections.responsibilities))
        .bind(section_to_json(&self.sections.requirements))
        .bind(section_to_json(&self.sections.skills_and_qualities))
        .bind(section_to_json(&self.sections.salary_info))
        .bind(section_to_json(&self.sections.about_company))
        .bind(&self.full_text)
        .bind(&self.link)
        .bind(&self.source)
        .bind(self.created_at)
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to insert posting {}", self.link))?;

        Ok(row.into())
    }

    /// Delete every posting of a scope. NULL location/discipline match NULL.
    pub async fn delete_for_scope(scope: &ScopeKey, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM postings
            WHERE owner_id = $1
              AND job_type = $2
              AND location IS NOT DISTINCT FROM $3
              AND discipline IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(scope.owner_id)
        .bind(&scope.job_type)
        .bind(&scope.location)
        .bind(&scope.discipline)
        .execute(pool)
        .await
        .context("failed to delete postings for scope")?;

        Ok(result.rows_affected())
    }

    /// All postings, oldest first
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, PostingRow>(
            "SELECT * FROM postings ORDER BY created_at, id",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Postings with the nearest known deadline first
    pub async fn find_closing_soon(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, PostingRow>(
            r#"
            SELECT * FROM postings
            WHERE closing_at IS NOT NULL
            ORDER BY closing_at ASC, id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn delete_all(pool: &PgPool) -> Result<u64> {
        let result = sqlx::query("DELETE FROM postings").execute(pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_for_owner(owner_id: MemberId, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query("DELETE FROM postings WHERE owner_id = $1")
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
