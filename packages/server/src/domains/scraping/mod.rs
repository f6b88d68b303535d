pub mod activities;
pub mod closing_date;
pub mod events;

pub use closing_date::{normalize_closing, ClosingDate};
pub use events::{LiveEvent, PostingUpdate, RunComplete};
