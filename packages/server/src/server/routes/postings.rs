//! Posting queries: search page, closing soon, resume suggestions.

use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::Deserialize;

use crate::domains::postings::activities::{
    closing_soon, search_postings, suggest_postings, SearchPage, Suggestions,
};
use crate::domains::postings::data::PostingData;
use crate::domains::postings::matching::{PostingFilters, MAX_FILTER_LEN};
use crate::kernel::RateAction;
use crate::server::app::AxumAppState;
use crate::server::error::{ApiError, ApiResult};
use crate::server::middleware::AuthUser;

/// `?search=&location=&type=&category=&offset=&limit=`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostingsQuery {
    search: String,
    location: String,
    #[serde(rename = "type")]
    job_type: String,
    category: String,
    offset: Option<usize>,
    limit: Option<usize>,
}

impl PostingsQuery {
    fn filters(&self) -> ApiResult<PostingFilters> {
        let filters = PostingFilters {
            search: self.search.trim().to_lowercase(),
            location: self.location.trim().to_lowercase(),
            job_type: self.job_type.trim().to_lowercase(),
            category: self.category.trim().to_lowercase(),
        };
        match filters.oversized_field() {
            Some(field) => Err(ApiError::InvalidRequest(format!(
                "{field} is longer than {MAX_FILTER_LEN} characters"
            ))),
            None => Ok(filters),
        }
    }
}

pub async fn list_postings_handler(
    Extension(state): Extension<AxumAppState>,
    _user: AuthUser,
    Query(query): Query<PostingsQuery>,
) -> ApiResult<Json<SearchPage>> {
    let page = search_postings(
        &query.filters()?,
        query.offset.unwrap_or(0),
        query.limit,
        &state.deps,
    )
    .await?;
    Ok(Json(page))
}

pub async fn closing_soon_handler(
    Extension(state): Extension<AxumAppState>,
    _user: AuthUser,
) -> ApiResult<Json<Vec<PostingData>>> {
    Ok(Json(closing_soon(&state.deps).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestBody {
    resume_text: String,
}

pub async fn suggestions_handler(
    Extension(state): Extension<AxumAppState>,
    user: AuthUser,
    Json(body): Json<SuggestBody>,
) -> ApiResult<Json<Suggestions>> {
    if body.resume_text.trim().is_empty() {
        return Err(ApiError::InvalidRequest("resumeText is empty".to_string()));
    }
    if !state
        .deps
        .rate_gate
        .allow(user.member_id, RateAction::SuggestPostings)
    {
        return Err(ApiError::RateLimited(RateAction::SuggestPostings));
    }

    Ok(Json(suggest_postings(&body.resume_text, &state.deps).await?))
}
