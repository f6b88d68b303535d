//! Scrape run: replace one scope's postings with a fresh harvest.
//!
//! A run deletes its scope, harvests the board, and persists and publishes each
//! posting as it arrives. Whatever happens along the way, the run's last
//! published event is its `Complete`.

use std::sync::Arc;

use harvester::{RawPosting, SearchQuery};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::common::{MemberId, ScrapeRunId};
use crate::domains::postings::data::PostingData;
use crate::domains::postings::models::{Posting, ScopeKey};
use crate::domains::scraping::closing_date::normalize_closing;
use crate::domains::scraping::events::LiveEvent;
use crate::kernel::{LiveEventChannel, ServerDeps};

/// A request to scrape one scope for one member
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeRequest {
    pub run_id: ScrapeRunId,
    pub owner_id: MemberId,
    pub query: SearchQuery,
}

impl ScrapeRequest {
    /// New run for `query`. Blank optional fields become absent.
    pub fn new(owner_id: MemberId, query: SearchQuery) -> Self {
        let query = SearchQuery {
            job_type: query.job_type.trim().to_string(),
            discipline: non_blank(query.discipline),
            location: non_blank(query.location),
            keyword: non_blank(query.keyword),
        };
        Self {
            run_id: ScrapeRunId::new(),
            owner_id,
            query,
        }
    }

    pub fn scope(&self) -> ScopeKey {
        ScopeKey::new(
            self.owner_id,
            self.query.job_type.clone(),
            self.query.location.clone(),
            self.query.discipline.clone(),
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// What a finished run did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeRunReport {
    pub run_id: ScrapeRunId,
    /// Postings removed from the scope before harvesting
    pub deleted: u64,
    pub persisted: usize,
    /// Postings harvested but not stored
    pub failed: usize,
    /// Set when the scope could not be cleared or the harvest aborted
    pub error: Option<String>,
}

/// Publishes the run's `Complete` when dropped, so it goes out on every exit
/// path including panics and task aborts.
struct CompletionGuard {
    run_id: ScrapeRunId,
    live_events: LiveEventChannel,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.live_events.publish(LiveEvent::complete(self.run_id));
    }
}

/// Start a run in the background. The run outlives the request that asked for it.
///
/// The run's owner is recorded on the live channel before this returns, so a
/// subscriber holding the run id can already be checked against it.
pub fn spawn_scrape_run(request: ScrapeRequest, deps: Arc<ServerDeps>) -> JoinHandle<ScrapeRunReport> {
    deps.live_events.register_run(request.run_id, request.owner_id);
    tokio::spawn(async move { run_scrape(request, &deps).await })
}

pub async fn run_scrape(request: ScrapeRequest, deps: &ServerDeps) -> ScrapeRunReport {
    let _complete = CompletionGuard {
        run_id: request.run_id,
        live_events: deps.live_events.clone(),
    };

    let run_id = request.run_id;
    let scope = request.scope();
    let mut report = ScrapeRunReport {
        run_id,
        ..Default::default()
    };

    info!(
        run_id = %run_id,
        owner_id = %scope.owner_id,
        job_type = %scope.job_type,
        location = ?scope.location,
        discipline = ?scope.discipline,
        "scrape run started"
    );

    // A harvest on top of stale rows would merge instead of replace
    match deps.postings.delete_scope(&scope).await {
        Ok(deleted) => report.deleted = deleted,
        Err(e) => {
            error!(run_id = %run_id, error = %e, "failed to clear scope, skipping harvest");
            report.error = Some(format!("{:#}", e));
            return report;
        }
    }

    let (sink, harvested) = mpsc::unbounded_channel();
    let (harvest, (persisted, failed)) = tokio::join!(
        deps.harvester.harvest(&request.query, sink),
        persist_postings(harvested, run_id, &scope, deps),
    );

    report.persisted = persisted;
    report.failed = failed;
    match harvest {
        Ok(summary) => info!(
            run_id = %run_id,
            pages = summary.pages_processed,
            persisted,
            failed,
            duplicates_skipped = summary.duplicates_skipped,
            listings_failed = summary.listings_failed,
            "scrape run finished"
        ),
        Err(e) => {
            error!(run_id = %run_id, error = %e, persisted, "harvest aborted");
            report.error = Some(format!("{:#}", e));
        }
    }

    report
}

/// Store and publish postings until the harvester hangs up.
/// Returns (persisted, failed).
async fn persist_postings(
    mut harvested: mpsc::UnboundedReceiver<RawPosting>,
    run_id: ScrapeRunId,
    scope: &ScopeKey,
    deps: &ServerDeps,
) -> (usize, usize) {
    let (mut persisted, mut failed) = (0, 0);

    while let Some(raw) = harvested.recv().await {
        let link = raw.link.clone();
        match deps.postings.insert(build_posting(raw, scope, deps)).await {
            Ok(saved) => {
                deps.live_events
                    .publish(LiveEvent::posting(run_id, PostingData::from(&saved)));
                persisted += 1;
            }
            Err(e) => {
                error!(run_id = %run_id, link = %link, error = %e, "failed to store posting");
                failed += 1;
            }
        }

        if !deps.pacing.is_zero() {
            tokio::time::sleep(deps.pacing).await;
        }
    }

    if persisted == 0 && failed == 0 {
        warn!(run_id = %run_id, "harvest produced no postings");
    }
    (persisted, failed)
}

fn build_posting(raw: RawPosting, scope: &ScopeKey, deps: &ServerDeps) -> Posting {
    let now = deps.clock.now();
    let closing = normalize_closing(&raw.closing_text, now);

    Posting::builder()
        .owner_id(scope.owner_id)
        .job_type(scope.job_type.clone())
        .location(scope.location.clone())
        .discipline(scope.discipline.clone())
        .title(raw.title)
        .posted_date(raw.posted_date)
        .closing_text(closing.text)
        .closing_at(closing.closes_at)
        .ai_summary(raw.ai_summary)
        .sections(raw.sections)
        .full_text(raw.full_text)
        .link(raw.link)
        .created_at(now)
        .build()
}
