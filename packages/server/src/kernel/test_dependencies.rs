// TestDependencies - in-memory implementations for testing
//
// Provides stores, harvesters and clocks that can be injected into ServerDeps
// so activities and routes run without Postgres or a browser.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use harvester::{HarvestSummary, RawPosting, SearchQuery, Sections};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use super::{
    BaseClock, BaseHarvester, BasePostingStore, LiveEventChannel, RateAction, RateGate,
    RatePolicy, ServerDeps, SkillKeywordExtractor,
};
use crate::config::MatchConfig;
use crate::domains::auth::JwtService;
use crate::domains::postings::models::{Posting, ScopeKey};

pub const TEST_JWT_SECRET: &str = "test_secret_key";
pub const TEST_JWT_ISSUER: &str = "careerlink";

// =============================================================================
// Manual Clock
// =============================================================================

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let by = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
        *self.now.lock().unwrap() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at(Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap())
    }
}

impl BaseClock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// =============================================================================
// In-Memory Posting Store
// =============================================================================

#[derive(Default)]
pub struct InMemoryPostingStore {
    postings: Mutex<Vec<Posting>>,
    failing_links: Mutex<HashSet<String>>,
    unavailable: Mutex<bool>,
}

impl InMemoryPostingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_postings(postings: Vec<Posting>) -> Self {
        let store = Self::default();
        *store.postings.lock().unwrap() = postings;
        store
    }

    /// Inserting a posting with this link fails
    pub fn fail_inserts_for(&self, link: &str) {
        self.failing_links.lock().unwrap().insert(link.to_string());
    }

    /// Every call fails, as if the database were down
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    pub fn postings(&self) -> Vec<Posting> {
        self.postings.lock().unwrap().clone()
    }

    pub fn postings_in(&self, scope: &ScopeKey) -> Vec<Posting> {
        self.postings()
            .into_iter()
            .filter(|posting| posting.in_scope(scope))
            .collect()
    }

    fn check_available(&self) -> Result<()> {
        if *self.unavailable.lock().unwrap() {
            return Err(anyhow!("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl BasePostingStore for InMemoryPostingStore {
    async fn delete_scope(&self, scope: &ScopeKey) -> Result<u64> {
        self.check_available()?;
        let mut postings = self.postings.lock().unwrap();
        let before = postings.len();
        postings.retain(|posting| !posting.in_scope(scope));
        Ok((before - postings.len()) as u64)
    }

    async fn insert(&self, posting: Posting) -> Result<Posting> {
        self.check_available()?;
        if self.failing_links.lock().unwrap().contains(&posting.link) {
            return Err(anyhow!("value too long for column \"link\""));
        }
        self.postings.lock().unwrap().push(posting.clone());
        Ok(posting)
    }

    async fn list_all(&self) -> Result<Vec<Posting>> {
        self.check_available()?;
        Ok(self.postings())
    }

    async fn closing_soon(&self, limit: usize) -> Result<Vec<Posting>> {
        self.check_available()?;
        let mut dated: Vec<Posting> = self
            .postings()
            .into_iter()
            .filter(|posting| posting.closing_at.is_some())
            .collect();
        dated.sort_by_key(|posting| (posting.closing_at, posting.id));
        dated.truncate(limit);
        Ok(dated)
    }

    async fn ping(&self) -> Result<()> {
        self.check_available()
    }
}

// =============================================================================
// Stub Harvester
// =============================================================================

#[derive(Clone)]
enum StubFailure {
    /// Return an error after sending this many postings
    After(usize, String),
    Panic,
}

/// Harvester that replays canned postings
#[derive(Clone, Default)]
pub struct StubHarvester {
    postings: Vec<RawPosting>,
    failure: Option<StubFailure>,
    calls: Arc<Mutex<Vec<SearchQuery>>>,
}

impl StubHarvester {
    pub fn new(postings: Vec<RawPosting>) -> Self {
        Self {
            postings,
            ..Default::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Deliver the first `sent` postings, then fail as if the browser died
    pub fn failing_after(mut self, sent: usize, message: &str) -> Self {
        self.failure = Some(StubFailure::After(sent, message.to_string()));
        self
    }

    pub fn panicking() -> Self {
        Self {
            failure: Some(StubFailure::Panic),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<SearchQuery> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseHarvester for StubHarvester {
    async fn harvest(
        &self,
        query: &SearchQuery,
        sink: mpsc::UnboundedSender<RawPosting>,
    ) -> Result<HarvestSummary> {
        self.calls.lock().unwrap().push(query.clone());

        if let Some(StubFailure::Panic) = &self.failure {
            panic!("browser crashed");
        }

        let mut summary = HarvestSummary {
            pages_processed: 1,
            ..Default::default()
        };
        for (sent, posting) in self.postings.iter().enumerate() {
            if let Some(StubFailure::After(limit, message)) = &self.failure {
                if sent == *limit {
                    return Err(anyhow!(message.clone()));
                }
            }
            if sink.send(posting.clone()).is_err() {
                break;
            }
            summary.postings += 1;
        }

        if let Some(StubFailure::After(limit, message)) = &self.failure {
            if *limit >= self.postings.len() {
                return Err(anyhow!(message.clone()));
            }
        }
        Ok(summary)
    }
}

/// A harvested posting with just enough content to be useful in tests
pub fn raw_posting(title: &str, link: &str) -> RawPosting {
    RawPosting {
        title: title.to_string(),
        ai_summary: Some(format!("{} in a friendly team.", title)),
        full_text: format!("{}. Apply now.", title),
        posted_date: "Posted 2 days ago".to_string(),
        closing_text: "Closing in 5 days".to_string(),
        sections: Sections {
            about_company: vec!["Acme".to_string()],
            ..Default::default()
        },
        link: link.to_string(),
    }
}

// =============================================================================
// Test Dependencies
// =============================================================================

/// Builder for a ServerDeps wired to in-memory collaborators
pub struct TestDependencies {
    pub postings: Arc<InMemoryPostingStore>,
    pub harvester: StubHarvester,
    pub clock: Arc<ManualClock>,
    pub live_events: LiveEventChannel,
    pub scrape_policy: RatePolicy,
    pub suggest_policy: RatePolicy,
    pub stream_wait: Duration,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            postings: Arc::new(InMemoryPostingStore::new()),
            harvester: StubHarvester::empty(),
            clock: Arc::new(ManualClock::default()),
            live_events: LiveEventChannel::new(),
            scrape_policy: RatePolicy::per_hour(5),
            suggest_policy: RatePolicy::per_hour(10),
            stream_wait: Duration::from_secs(30),
        }
    }

    pub fn with_harvester(mut self, harvester: StubHarvester) -> Self {
        self.harvester = harvester;
        self
    }

    pub fn with_postings(mut self, postings: Vec<Posting>) -> Self {
        self.postings = Arc::new(InMemoryPostingStore::with_postings(postings));
        self
    }

    pub fn with_scrape_policy(mut self, policy: RatePolicy) -> Self {
        self.scrape_policy = policy;
        self
    }

    pub fn jwt_service(&self) -> JwtService {
        JwtService::new(TEST_JWT_SECRET, TEST_JWT_ISSUER.to_string())
    }

    pub fn server_deps(&self) -> ServerDeps {
        let rate_gate = RateGate::new(self.clock.clone())
            .with_policy(RateAction::StartScrape, self.scrape_policy)
            .with_policy(RateAction::SuggestPostings, self.suggest_policy);

        ServerDeps::new(
            self.postings.clone(),
            Arc::new(self.harvester.clone()),
            Arc::new(SkillKeywordExtractor),
            self.live_events.clone(),
            Arc::new(rate_gate),
            self.clock.clone(),
            Arc::new(self.jwt_service()),
            MatchConfig::default(),
            Duration::ZERO,
            self.stream_wait,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
