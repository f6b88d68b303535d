//! Job-Board Harvester
//!
//! Drives a browser session through a job board's paginated search results,
//! opens every listing's detail page and extracts structured fields from it.
//!
//! The library handles mechanics (URLs, pagination, tab handling, HTML
//! extraction); the application decides what to do with each posting.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use harvester::{Harvester, HarvestOptions, SearchQuery, WebDriverFactory};
//!
//! let factory = Arc::new(WebDriverFactory::new("http://localhost:9515"));
//! let harvester = Harvester::new(factory, "https://au.gradconnection.com")?;
//!
//! let query = SearchQuery::new("internships").with_location("perth");
//! let postings = harvester
//!     .fetch_listings(&query, HarvestOptions::new(3).headless(true))
//!     .await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Page-fetcher collaborator traits
//! - [`fetchers`] - WebDriver and mock fetchers
//! - [`extract`] - HTML extraction of result cards and detail pages
//! - [`search_url`] - Search URL construction
//! - [`harvest`] - The paginating harvest loop

pub mod error;
pub mod extract;
pub mod fetchers;
pub mod harvest;
pub mod search_url;
pub mod traits;
pub mod types;

pub use error::{HarvestError, HarvestResult};
pub use fetchers::{MockFetcher, MockFetcherFactory, WebDriverFactory, WebDriverFetcher};
pub use harvest::{HarvestOptions, HarvestSummary, Harvester};
pub use traits::fetcher::{FetcherFactory, PageFetcher};
pub use types::{ListingCard, RawPosting, ResultsPage, SearchQuery, Section, Sections};
