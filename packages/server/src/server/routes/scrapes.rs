//! Scrape-start endpoint.
//!
//! POST /api/scrapes
//!
//! Accepts the search, checks the caller's rate window and detaches a scrape
//! run. Responds before the run does any work.

use axum::{extract::Extension, http::StatusCode, Json};
use harvester::SearchQuery;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::common::ScrapeRunId;
use crate::domains::scraping::activities::{spawn_scrape_run, ScrapeRequest};
use crate::kernel::RateAction;
use crate::server::app::AxumAppState;
use crate::server::error::{ApiError, ApiResult};
use crate::server::middleware::AuthUser;

pub const DEFAULT_JOB_TYPE: &str = "internships";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartScrapeBody {
    pub job_type: Option<String>,
    pub discipline: Option<String>,
    pub location: Option<String>,
    pub keyword: Option<String>,
}

impl StartScrapeBody {
    fn into_query(self) -> SearchQuery {
        let job_type = self
            .job_type
            .filter(|job_type| !job_type.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_JOB_TYPE.to_string());
        SearchQuery {
            job_type,
            discipline: self.discipline,
            location: self.location,
            keyword: self.keyword,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartScrapeResponse {
    pub run_id: ScrapeRunId,
}

pub async fn start_scrape_handler(
    Extension(state): Extension<AxumAppState>,
    user: AuthUser,
    Json(body): Json<StartScrapeBody>,
) -> ApiResult<(StatusCode, Json<StartScrapeResponse>)> {
    if !state
        .deps
        .rate_gate
        .allow(user.member_id, RateAction::StartScrape)
    {
        return Err(ApiError::RateLimited(RateAction::StartScrape));
    }

    let request = ScrapeRequest::new(user.member_id, body.into_query());
    let run_id = request.run_id;
    info!(run_id = %run_id, member_id = %user.member_id, "scrape accepted");

    // Detached: the run keeps going after this response and any disconnect
    drop(spawn_scrape_run(request, state.deps.clone()));

    Ok((StatusCode::ACCEPTED, Json(StartScrapeResponse { run_id })))
}
