//! SSE live stream of scrape runs.
//!
//! GET /api/scrapes/stream?runId=&token=JWT
//!
//! Auth: the JWT may come as `?token=` because EventSource can't send custom
//! headers; the auth middleware accepts either.
//!
//! With `runId` only that run's events are taken off the live channel, and only
//! by the member who started the run. Without
//! it the subscriber takes whatever is at the head of the channel. The stream
//! ends after a completion event. A `ping` goes out whenever nothing arrives
//! within the stream wait.

use std::convert::Infallible;

use axum::{
    extract::{Extension, Query},
    response::sse::{Event, Sse},
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::common::ScrapeRunId;
use crate::kernel::StreamMessage;
use crate::server::app::AxumAppState;
use crate::server::error::{ApiError, ApiResult};
use crate::server::middleware::AuthUser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamQuery {
    run_id: Option<ScrapeRunId>,
}

pub async fn stream_handler(
    Extension(state): Extension<AxumAppState>,
    user: AuthUser,
    Query(query): Query<StreamQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    if let Some(run_id) = query.run_id {
        let owner = state.deps.live_events.run_owner(run_id);
        if owner.is_some_and(|owner| owner != user.member_id) {
            warn!(
                member_id = %user.member_id,
                run_id = %run_id,
                "stream refused for another member's run"
            );
            return Err(ApiError::Forbidden);
        }
    }
    debug!(member_id = %user.member_id, run_id = ?query.run_id, "live stream opened");

    let messages = state
        .deps
        .live_events
        .subscribe(query.run_id, state.deps.stream_wait);

    let events = messages
        .filter_map(|message| async move { to_sse_event(&message).map(Ok::<_, Infallible>) });

    Ok(Sse::new(events))
}

fn to_sse_event(message: &StreamMessage) -> Option<Event> {
    match message {
        StreamMessage::Event(event) => Event::default()
            .event(event.event_name())
            .json_data(event)
            .ok(),
        StreamMessage::Ping => Event::default()
            .event("ping")
            .json_data(json!({"type": "ping"}))
            .ok(),
    }
}
