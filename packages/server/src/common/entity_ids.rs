//! Typed IDs for the entities the server stores or hands out.
//!
//! ```rust
//! use server_core::common::{MemberId, PostingId};
//!
//! let member_id = MemberId::new();
//! let posting_id = PostingId::new();
//! // let wrong: PostingId = member_id; // does not compile
//! # let _ = (member_id, posting_id);
//! ```

pub use super::id::Id;

/// Marker type for members (the authenticated user).
pub struct Member;

/// Marker type for persisted job postings.
pub struct Posting;

/// Marker type for one scrape invocation.
pub struct ScrapeRun;

pub type MemberId = Id<Member>;
pub type PostingId = Id<Posting>;
pub type ScrapeRunId = Id<ScrapeRun>;
