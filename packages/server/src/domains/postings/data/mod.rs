pub mod posting;

pub use posting::{PostingData, PostingTags};
