//! Mock fetcher for testing.
//!
//! Serves canned HTML by URL and records every call.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::error::{HarvestError, HarvestResult};
use crate::traits::fetcher::{FetcherFactory, PageFetcher};

const EMPTY_PAGE: &str = "<html><body></body></html>";

/// Mock fetcher with canned pages.
///
/// Unknown results-page URLs render an empty page (zero cards), which ends
/// pagination just like running off the end of a real result set.
///
/// # Example
///
/// ```rust
/// use harvester::MockFetcher;
///
/// let mock = MockFetcher::new()
///     .with_results_page("https://x.test/internships/", "<div class=\"campaign-box\"></div>")
///     .with_detail_page("https://x.test/jobs/1", "<h1 class=\"employers-profile-h1\">Dev</h1>");
/// ```
#[derive(Clone, Default)]
pub struct MockFetcher {
    results_pages: Arc<RwLock<HashMap<String, String>>>,
    detail_pages: Arc<RwLock<HashMap<String, String>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    unreadable: Arc<RwLock<HashSet<String>>>,
    session_lost_at: Arc<RwLock<Option<String>>>,
    results_calls: Arc<RwLock<Vec<String>>>,
    detail_calls: Arc<RwLock<Vec<String>>>,
    shutdowns: Arc<RwLock<usize>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results_page(self, url: &str, html: &str) -> Self {
        self.results_pages
            .write()
            .unwrap()
            .insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_detail_page(self, url: &str, html: &str) -> Self {
        self.detail_pages
            .write()
            .unwrap()
            .insert(url.to_string(), html.to_string());
        self
    }

    /// Loading this URL fails with a recoverable navigation error.
    pub fn failing(self, url: &str) -> Self {
        self.failing.write().unwrap().insert(url.to_string());
        self
    }

    /// This detail page opens but its tab cannot be read (crashed renderer).
    pub fn unreadable(self, url: &str) -> Self {
        self.unreadable.write().unwrap().insert(url.to_string());
        self
    }

    /// Loading this URL reports a lost browser session.
    pub fn losing_session_at(self, url: &str) -> Self {
        *self.session_lost_at.write().unwrap() = Some(url.to_string());
        self
    }

    pub fn results_calls(&self) -> Vec<String> {
        self.results_calls.read().unwrap().clone()
    }

    pub fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.read().unwrap().clone()
    }

    pub fn shutdown_count(&self) -> usize {
        *self.shutdowns.read().unwrap()
    }

    fn check(&self, url: &str) -> HarvestResult<()> {
        if self.session_lost_at.read().unwrap().as_deref() == Some(url) {
            return Err(HarvestError::session("session deleted"));
        }
        if self.failing.read().unwrap().contains(url) {
            return Err(HarvestError::navigation(url, "page load timed out"));
        }
        Ok(())
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn load_results_page(&self, url: &str) -> HarvestResult<String> {
        self.results_calls.write().unwrap().push(url.to_string());
        self.check(url)?;
        Ok(self
            .results_pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| EMPTY_PAGE.to_string()))
    }

    async fn load_detail_page(&self, url: &str) -> HarvestResult<String> {
        self.detail_calls.write().unwrap().push(url.to_string());
        self.check(url)?;
        if self.unreadable.read().unwrap().contains(url) {
            return Err(HarvestError::listing(url, "tab crashed"));
        }
        self.detail_pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| HarvestError::navigation(url, "404 Not Found"))
    }

    async fn shutdown(&self) -> HarvestResult<()> {
        *self.shutdowns.write().unwrap() += 1;
        Ok(())
    }
}

/// Hands out clones of one [`MockFetcher`], so tests can inspect its calls.
#[derive(Clone, Default)]
pub struct MockFetcherFactory {
    fetcher: MockFetcher,
    refuse: bool,
}

impl MockFetcherFactory {
    pub fn new(fetcher: MockFetcher) -> Self {
        Self {
            fetcher,
            refuse: false,
        }
    }

    /// A factory whose sessions never start (chromedriver not running).
    pub fn unavailable() -> Self {
        Self {
            fetcher: MockFetcher::new(),
            refuse: true,
        }
    }

    pub fn fetcher(&self) -> &MockFetcher {
        &self.fetcher
    }
}

#[async_trait]
impl FetcherFactory for MockFetcherFactory {
    async fn connect(&self, _headless: bool) -> HarvestResult<Box<dyn PageFetcher>> {
        if self.refuse {
            return Err(HarvestError::session("connection refused"));
        }
        Ok(Box::new(self.fetcher.clone()))
    }
}
