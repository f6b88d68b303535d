//! Server dependencies for activities (using traits for testability)
//!
//! This module provides the central dependency container used by domain
//! activities and HTTP handlers. External systems sit behind Base* traits; the
//! adapters that bind them to Postgres and the browser harvester live here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use harvester::{HarvestOptions, HarvestSummary, Harvester, RawPosting, SearchQuery};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::MatchConfig;
use crate::domains::auth::JwtService;
use crate::domains::postings::models::{Posting, ScopeKey};
use crate::kernel::{
    BaseClock, BaseHarvester, BaseKeywordExtractor, BasePostingStore, LiveEventChannel, RateGate,
};

// =============================================================================
// Postgres Posting Store (implements BasePostingStore trait)
// =============================================================================

/// Posting store backed by the `postings` table
pub struct PostgresPostingStore(pub PgPool);

impl PostgresPostingStore {
    pub fn new(pool: PgPool) -> Self {
        Self(pool)
    }
}

#[async_trait]
impl BasePostingStore for PostgresPostingStore {
    async fn delete_scope(&self, scope: &ScopeKey) -> Result<u64> {
        Posting::delete_for_scope(scope, &self.0).await
    }

    async fn insert(&self, posting: Posting) -> Result<Posting> {
        posting.insert(&self.0).await
    }

    async fn list_all(&self) -> Result<Vec<Posting>> {
        Posting::find_all(&self.0).await
    }

    async fn closing_soon(&self, limit: usize) -> Result<Vec<Posting>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Posting::find_closing_soon(limit, &self.0).await
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.0)
            .await
            .map(|_| ())
            .context("database ping failed")
    }
}

// =============================================================================
// Board Harvester Adapter (implements BaseHarvester trait)
// =============================================================================

/// Wrapper around the browser harvester that implements BaseHarvester
pub struct BoardHarvester {
    harvester: Harvester,
    options: HarvestOptions,
}

impl BoardHarvester {
    pub fn new(harvester: Harvester, options: HarvestOptions) -> Self {
        Self { harvester, options }
    }
}

#[async_trait]
impl BaseHarvester for BoardHarvester {
    async fn harvest(
        &self,
        query: &SearchQuery,
        sink: mpsc::UnboundedSender<RawPosting>,
    ) -> Result<HarvestSummary> {
        self.harvester
            .stream_listings(query, self.options, sink)
            .await
            .with_context(|| format!("harvest of {} aborted", self.harvester.base_url()))
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to activities (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub postings: Arc<dyn BasePostingStore>,
    pub harvester: Arc<dyn BaseHarvester>,
    pub keyword_extractor: Arc<dyn BaseKeywordExtractor>,
    /// Shared channel from scrape runs to stream subscribers
    pub live_events: LiveEventChannel,
    pub rate_gate: Arc<RateGate>,
    pub clock: Arc<dyn BaseClock>,
    pub jwt_service: Arc<JwtService>,
    pub matching: MatchConfig,
    /// Pause after each published posting
    pub pacing: Duration,
    /// How long a stream subscriber waits before pinging
    pub stream_wait: Duration,
}

impl ServerDeps {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        postings: Arc<dyn BasePostingStore>,
        harvester: Arc<dyn BaseHarvester>,
        keyword_extractor: Arc<dyn BaseKeywordExtractor>,
        live_events: LiveEventChannel,
        rate_gate: Arc<RateGate>,
        clock: Arc<dyn BaseClock>,
        jwt_service: Arc<JwtService>,
        matching: MatchConfig,
        pacing: Duration,
        stream_wait: Duration,
    ) -> Self {
        Self {
            postings,
            harvester,
            keyword_extractor,
            live_events,
            rate_gate,
            clock,
            jwt_service,
            matching,
            pacing,
            stream_wait,
        }
    }
}
