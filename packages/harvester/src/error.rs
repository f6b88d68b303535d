//! Typed errors for the harvester library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell
//! recoverable page failures from a broken browser session.

use std::fmt::Display;

use thiserror::Error;

/// Errors that can occur while harvesting a job board.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Browser session could not be created, or was lost mid-harvest
    #[error("browser session error: {0}")]
    Session(String),

    /// A single page failed to load
    #[error("failed to load {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// A listing's detail tab could not be opened or read
    #[error("failed to read listing {url}: {reason}")]
    Listing { url: String, reason: String },

    /// A URL could not be parsed or joined
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A CSS selector failed to parse
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
}

/// Result type for harvest operations.
pub type HarvestResult<T> = std::result::Result<T, HarvestError>;

impl HarvestError {
    pub fn session(err: impl Display) -> Self {
        Self::Session(err.to_string())
    }

    pub fn navigation(url: &str, err: impl Display) -> Self {
        Self::Navigation {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }

    pub fn listing(url: &str, err: impl Display) -> Self {
        Self::Listing {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }

    /// Whether the harvest as a whole must stop.
    ///
    /// Navigation and listing failures only cost the page they happened on.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Navigation { .. } | Self::Listing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_errors_are_recoverable() {
        let err = HarvestError::navigation("https://example.com/jobs", "timeout");
        assert!(!err.is_fatal());
        assert_eq!(
            err.to_string(),
            "failed to load https://example.com/jobs: timeout"
        );
    }

    #[test]
    fn listing_errors_are_recoverable() {
        let err = HarvestError::listing("https://example.com/jobs/1", "renderer crashed");
        assert!(!err.is_fatal());
    }

    #[test]
    fn session_errors_are_fatal() {
        assert!(HarvestError::session("chromedriver went away").is_fatal());
    }
}
