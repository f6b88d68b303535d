//! Page-fetcher traits.
//!
//! A fetcher is one live browser session. The harvester only ever asks it for
//! rendered HTML; everything browser-specific (overlays, lazy loading, tabs)
//! stays behind this boundary.

use async_trait::async_trait;

use crate::error::HarvestResult;

/// A browser session that can render job-board pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Load a search-results page in the main tab and return its HTML.
    ///
    /// Implementations dismiss the sign-in overlay when it appears and scroll
    /// to the bottom so lazily loaded cards are present.
    async fn load_results_page(&self, url: &str) -> HarvestResult<String>;

    /// Load a listing's detail page in a separate tab and return its HTML.
    ///
    /// The tab is closed and the main tab re-focused before returning, whether
    /// or not the load succeeded.
    async fn load_detail_page(&self, url: &str) -> HarvestResult<String>;

    /// End the session.
    async fn shutdown(&self) -> HarvestResult<()>;
}

/// Opens browser sessions.
#[async_trait]
pub trait FetcherFactory: Send + Sync {
    async fn connect(&self, headless: bool) -> HarvestResult<Box<dyn PageFetcher>>;
}
