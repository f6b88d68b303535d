// Business domains
pub mod auth;
pub mod postings;
pub mod scraping;
