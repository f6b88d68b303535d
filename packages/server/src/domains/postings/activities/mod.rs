//! Postings domain activities - entry-point business logic
//!
//! Called from the HTTP routes. Activities take raw input plus `&ServerDeps`
//! and return API-ready data.

pub mod closing_soon;
pub mod search;
pub mod suggest;

pub use closing_soon::{closing_soon, CLOSING_SOON_LIMIT};
pub use search::{search_postings, SearchPage, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use suggest::{suggest_postings, Suggestions, MAX_SUGGESTIONS};
