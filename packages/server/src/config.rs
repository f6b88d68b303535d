use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub scrape: ScrapeConfig,
    pub matching: MatchConfig,
    pub rate_limits: RateLimitConfig,
    pub live: LiveConfig,
}

/// Browser harvesting settings
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub webdriver_url: String,
    pub job_board_base_url: String,
    pub max_pages: u32,
    pub headless: bool,
    /// Time given to client-side rendering after each page load
    pub page_settle: Duration,
    /// Pause after each posting is published, so the stream stays readable
    pub pacing: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchConfig {
    /// Facet filters
    pub threshold: f64,
    /// Free-text search and resume suggestions
    pub search_threshold: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub scrape_limit: usize,
    pub scrape_window: Duration,
    pub suggest_limit: usize,
    pub suggest_window: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct LiveConfig {
    pub channel_capacity: usize,
    /// How long a stream consumer blocks before sending a ping
    pub stream_wait: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            job_board_base_url: "https://au.gradconnection.com".to_string(),
            max_pages: 3,
            headless: true,
            page_settle: Duration::from_millis(1000),
            pacing: Duration::from_millis(100),
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            search_threshold: 0.35,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            scrape_limit: 5,
            scrape_window: Duration::from_secs(3600),
            suggest_limit: 10,
            suggest_window: Duration::from_secs(3600),
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 10_000,
            stream_wait: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let scrape_defaults = ScrapeConfig::default();
        let match_defaults = MatchConfig::default();
        let rate_defaults = RateLimitConfig::default();
        let live_defaults = LiveConfig::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: parse_or("SERVER_PORT", 8080)?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "careerlink".to_string()),
            scrape: ScrapeConfig {
                webdriver_url: env::var("WEBDRIVER_URL")
                    .unwrap_or(scrape_defaults.webdriver_url),
                job_board_base_url: env::var("JOB_BOARD_BASE_URL")
                    .unwrap_or(scrape_defaults.job_board_base_url),
                max_pages: parse_or("SCRAPE_MAX_PAGES", scrape_defaults.max_pages)?,
                headless: parse_or("SCRAPE_HEADLESS", scrape_defaults.headless)?,
                page_settle: Duration::from_millis(parse_or(
                    "SCRAPE_PAGE_SETTLE_MS",
                    scrape_defaults.page_settle.as_millis() as u64,
                )?),
                pacing: Duration::from_millis(parse_or("SCRAPE_PACING_MS", 100u64)?),
            },
            matching: MatchConfig {
                threshold: parse_or("MATCH_THRESHOLD", match_defaults.threshold)?,
                search_threshold: parse_or(
                    "SEARCH_MATCH_THRESHOLD",
                    match_defaults.search_threshold,
                )?,
            },
            rate_limits: RateLimitConfig {
                scrape_limit: parse_or("SCRAPE_RATE_LIMIT", rate_defaults.scrape_limit)?,
                scrape_window: Duration::from_secs(parse_or(
                    "SCRAPE_RATE_WINDOW_SECS",
                    rate_defaults.scrape_window.as_secs(),
                )?),
                suggest_limit: parse_or("SUGGEST_RATE_LIMIT", rate_defaults.suggest_limit)?,
                suggest_window: Duration::from_secs(parse_or(
                    "SUGGEST_RATE_WINDOW_SECS",
                    rate_defaults.suggest_window.as_secs(),
                )?),
            },
            live: LiveConfig {
                channel_capacity: parse_or(
                    "LIVE_CHANNEL_CAPACITY",
                    live_defaults.channel_capacity,
                )?,
                stream_wait: Duration::from_secs(parse_or(
                    "STREAM_WAIT_SECS",
                    live_defaults.stream_wait.as_secs(),
                )?),
            },
        })
    }
}

/// Parse an optional variable, falling back to `default` when it is unset.
fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid {}", name, std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}
