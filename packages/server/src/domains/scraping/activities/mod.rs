//! Scraping domain activities

pub mod run_scrape;

pub use run_scrape::{run_scrape, spawn_scrape_run, ScrapeRequest, ScrapeRunReport};
