pub mod activities;
pub mod data;
pub mod matching;
pub mod models;

pub use data::{PostingData, PostingTags};
pub use matching::{matches, PostingFilters};
pub use models::{Posting, ScopeKey};
