//! Fetcher implementations.
//!
//! - `WebDriverFetcher` - Chrome via a running chromedriver
//! - `MockFetcher` - For testing

mod mock;
mod webdriver;

pub use mock::{MockFetcher, MockFetcherFactory};
pub use webdriver::{WebDriverFactory, WebDriverFetcher};
