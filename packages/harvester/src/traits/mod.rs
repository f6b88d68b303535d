//! Core trait abstractions.

pub mod fetcher;

pub use fetcher::{FetcherFactory, PageFetcher};
