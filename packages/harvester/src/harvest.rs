//! The paginating harvest loop.
//!
//! Walks results pages `1..=max_pages`, stopping early at the first page with
//! no cards. Every card link not seen earlier in the run is opened and
//! extracted. A failing listing is logged and skipped; only a fatal
//! [`HarvestError`](crate::HarvestError) ends the harvest with an error.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::HarvestResult;
use crate::extract;
use crate::search_url::{build_search_url, with_page_param};
use crate::traits::fetcher::{FetcherFactory, PageFetcher};
use crate::types::{RawPosting, SearchQuery};

/// Per-harvest knobs.
#[derive(Debug, Clone, Copy)]
pub struct HarvestOptions {
    pub max_pages: u32,
    pub headless: bool,
}

impl HarvestOptions {
    pub fn new(max_pages: u32) -> Self {
        Self {
            max_pages,
            headless: true,
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }
}

/// Counters for one harvest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Results pages that had at least one card
    pub pages_processed: u32,
    pub postings: usize,
    pub duplicates_skipped: usize,
    pub listings_failed: usize,
}

/// Harvests one job board.
#[derive(Clone)]
pub struct Harvester {
    factory: Arc<dyn FetcherFactory>,
    base_url: Url,
}

impl Harvester {
    pub fn new(factory: Arc<dyn FetcherFactory>, base_url: &str) -> HarvestResult<Self> {
        Ok(Self {
            factory,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Harvest everything and return it in extraction order.
    pub async fn fetch_listings(
        &self,
        query: &SearchQuery,
        options: HarvestOptions,
    ) -> HarvestResult<Vec<RawPosting>> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.stream_listings(query, options, tx).await?;

        let mut postings = Vec::new();
        while let Some(posting) = rx.recv().await {
            postings.push(posting);
        }
        Ok(postings)
    }

    /// Harvest, sending each posting to `sink` as soon as it is extracted.
    ///
    /// The browser session is shut down before returning, on every path.
    /// Dropping the receiving end stops the harvest after the current listing.
    pub async fn stream_listings(
        &self,
        query: &SearchQuery,
        options: HarvestOptions,
        sink: mpsc::UnboundedSender<RawPosting>,
    ) -> HarvestResult<HarvestSummary> {
        let fetcher = self.factory.connect(options.headless).await?;

        let result = self.walk_pages(fetcher.as_ref(), query, options.max_pages, &sink).await;

        if let Err(e) = fetcher.shutdown().await {
            warn!(error = %e, "failed to shut down browser session");
        }

        match &result {
            Ok(summary) => info!(
                job_type = %query.job_type,
                pages = summary.pages_processed,
                postings = summary.postings,
                failed = summary.listings_failed,
                "harvest finished"
            ),
            Err(e) => error!(job_type = %query.job_type, error = %e, "harvest aborted"),
        }

        result
    }

    async fn walk_pages(
        &self,
        fetcher: &dyn PageFetcher,
        query: &SearchQuery,
        max_pages: u32,
        sink: &mpsc::UnboundedSender<RawPosting>,
    ) -> HarvestResult<HarvestSummary> {
        let first_page = build_search_url(&self.base_url, query);
        let mut seen: HashSet<String> = HashSet::new();
        let mut summary = HarvestSummary::default();

        for page in 1..=max_pages {
            let page_url = if page == 1 {
                first_page.clone()
            } else {
                with_page_param(&first_page, page)
            };

            let html = match fetcher.load_results_page(&page_url).await {
                Ok(html) => html,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(page, error = %e, "results page failed, stopping pagination");
                    break;
                }
            };

            let results = extract::parse_results_page(&html, &Url::parse(&page_url)?)?;
            if results.card_count == 0 {
                debug!(page, "no listing cards, end of results");
                break;
            }
            summary.pages_processed += 1;

            for card in results.cards {
                if !seen.insert(card.link.clone()) {
                    summary.duplicates_skipped += 1;
                    continue;
                }

                match self.harvest_listing(fetcher, &card.link).await {
                    Ok(posting) => {
                        if sink.send(posting).is_err() {
                            debug!("posting receiver dropped, stopping harvest");
                            return Ok(summary);
                        }
                        summary.postings += 1;
                    }
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        warn!(link = %card.link, title = %card.title, error = %e, "skipping listing");
                        summary.listings_failed += 1;
                    }
                }
            }

            info!(page, collected = summary.postings, "results page processed");
        }

        Ok(summary)
    }

    async fn harvest_listing(&self, fetcher: &dyn PageFetcher, link: &str) -> HarvestResult<RawPosting> {
        let html = fetcher.load_detail_page(link).await?;
        extract::parse_detail_page(&html, link)
    }
}
