// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (scope replacement, matching, suggestions) lives in domain
// activities that use these traits.
//
// Naming convention: Base* for trait names (e.g., BasePostingStore, BaseHarvester)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harvester::{HarvestSummary, RawPosting, SearchQuery};
use tokio::sync::mpsc;

use crate::domains::postings::models::{Posting, ScopeKey};

// =============================================================================
// Posting Store Trait (Infrastructure - durable posting storage)
// =============================================================================

#[async_trait]
pub trait BasePostingStore: Send + Sync {
    /// Remove every posting of a scope, returning how many were removed
    async fn delete_scope(&self, scope: &ScopeKey) -> Result<u64>;

    /// Persist one posting
    async fn insert(&self, posting: Posting) -> Result<Posting>;

    /// Every stored posting in insertion order
    async fn list_all(&self) -> Result<Vec<Posting>>;

    /// Postings with a known deadline, nearest first
    async fn closing_soon(&self, limit: usize) -> Result<Vec<Posting>>;

    /// Cheap round trip used by the health check
    async fn ping(&self) -> Result<()>;
}

// =============================================================================
// Harvester Trait (Infrastructure - job-board page source)
// =============================================================================

#[async_trait]
pub trait BaseHarvester: Send + Sync {
    /// Harvest the board for `query`, sending each posting to `sink` as soon as
    /// it is extracted. An error means the harvest was aborted; postings sent
    /// before the failure stand.
    async fn harvest(
        &self,
        query: &SearchQuery,
        sink: mpsc::UnboundedSender<RawPosting>,
    ) -> Result<HarvestSummary>;
}

// =============================================================================
// Keyword Extraction Trait (Infrastructure - resume → search terms)
// =============================================================================

#[async_trait]
pub trait BaseKeywordExtractor: Send + Sync {
    /// Search terms for a block of free text, most relevant first
    async fn extract_keywords(&self, text: &str) -> Result<Vec<String>>;
}

// =============================================================================
// Clock Trait
// =============================================================================

pub trait BaseClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
