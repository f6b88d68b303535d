// CareerLink - API Core
//
// Backend for the job-acquisition pipeline: harvests graduate job boards,
// persists postings per scrape scope, streams them live to the client, and
// serves search, closing-soon and resume-suggestion queries.
//
// Layout follows domain-driven design: domains/ holds the business logic,
// kernel/ the infrastructure seams, server/ the HTTP surface.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
