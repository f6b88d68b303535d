//! Application setup and server configuration.
//!
//! `build_app` is the composition root: every piece of process-wide state
//! (posting store, harvester, live channel, rate gate, clock) is built here and
//! handed to routes and scrape runs through `ServerDeps`.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use harvester::{HarvestOptions, Harvester, WebDriverFactory};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domains::auth::JwtService;
use crate::kernel::{
    BoardHarvester, LiveEventChannel, PostgresPostingStore, RateAction, RateGate, RatePolicy,
    ServerDeps, SkillKeywordExtractor, SystemClock,
};
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    closing_soon_handler, health_handler, list_postings_handler, start_scrape_handler,
    stream_handler, suggestions_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub deps: Arc<ServerDeps>,
}

/// Wire production dependencies from configuration
pub fn build_server_deps(pool: PgPool, config: &Config) -> Result<ServerDeps> {
    let factory = Arc::new(
        WebDriverFactory::new(config.scrape.webdriver_url.clone())
            .with_settle(config.scrape.page_settle),
    );
    let harvester = Harvester::new(factory, &config.scrape.job_board_base_url)
        .context("Invalid JOB_BOARD_BASE_URL")?;
    let options = HarvestOptions::new(config.scrape.max_pages).headless(config.scrape.headless);

    let clock = Arc::new(SystemClock);
    let limits = config.rate_limits;
    let rate_gate = RateGate::new(clock.clone())
        .with_policy(
            RateAction::StartScrape,
            RatePolicy::new(limits.scrape_limit, limits.scrape_window),
        )
        .with_policy(
            RateAction::SuggestPostings,
            RatePolicy::new(limits.suggest_limit, limits.suggest_window),
        );

    Ok(ServerDeps::new(
        Arc::new(PostgresPostingStore::new(pool)),
        Arc::new(BoardHarvester::new(harvester, options)),
        Arc::new(SkillKeywordExtractor),
        LiveEventChannel::with_capacity(config.live.channel_capacity),
        Arc::new(rate_gate),
        clock,
        Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone())),
        config.matching,
        config.scrape.pacing,
        config.live.stream_wait,
    ))
}

/// Build the Axum application router
pub fn build_app(pool: PgPool, config: &Config) -> Result<Router> {
    let deps = build_server_deps(pool, config)?;
    Ok(build_router(Arc::new(deps)))
}

/// Router over already-built dependencies
pub fn build_router(deps: Arc<ServerDeps>) -> Router {
    let jwt_service = deps.jwt_service.clone();
    let app_state = AxumAppState { deps };

    // CORS configuration - allow any origin, the API is token-authenticated
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .route("/api/scrapes", post(start_scrape_handler))
        .route("/api/scrapes/stream", get(stream_handler))
        .route("/api/postings", get(list_postings_handler))
        .route("/api/postings/closing-soon", get(closing_soon_handler))
        .route("/api/postings/suggestions", post(suggestions_handler))
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), req, next)
        }))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
