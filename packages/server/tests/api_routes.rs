//! HTTP surface driven through the router with in-memory dependencies.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use server_core::common::{MemberId, ScrapeRunId};
use server_core::domains::postings::Posting;
use server_core::kernel::test_dependencies::{raw_posting, StubHarvester};
use server_core::kernel::{RatePolicy, TestDependencies};
use server_core::server::build_router;
use tower::ServiceExt;

fn router(test_deps: &TestDependencies) -> Router {
    build_router(Arc::new(test_deps.server_deps()))
}

fn token(test_deps: &TestDependencies, member_id: MemberId) -> String {
    test_deps.jwt_service().create_token(member_id).unwrap()
}

fn start_scrape(token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/scrapes")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// `data:` payloads of an SSE body, in order
fn sse_payloads(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}

#[tokio::test]
async fn scrape_start_requires_identity() {
    let test_deps = TestDependencies::new();
    let request = Request::builder()
        .method("POST")
        .uri("/api/scrapes")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = router(&test_deps).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn scrape_start_is_accepted_with_a_run_id() {
    let test_deps = TestDependencies::new();
    let token = token(&test_deps, MemberId::new());

    let response = router(&test_deps)
        .oneshot(start_scrape(&token, json!({"jobType": "internships"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = json_body(response).await;
    assert!(body["runId"].is_string());
}

#[tokio::test]
async fn sixth_scrape_in_an_hour_is_rate_limited() {
    let test_deps = TestDependencies::new().with_scrape_policy(RatePolicy::per_hour(5));
    let app = router(&test_deps);
    let token = token(&test_deps, MemberId::new());

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(start_scrape(&token, json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let response = app
        .clone()
        .oneshot(start_scrape(&token, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json_body(response).await["status"], 429);

    // Someone else still has their full window
    let other = token_for_new_member(&test_deps);
    let response = app.oneshot(start_scrape(&other, json!({}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

fn token_for_new_member(test_deps: &TestDependencies) -> String {
    token(test_deps, MemberId::new())
}

#[tokio::test]
async fn perth_internships_stream_until_complete() {
    let harvester = StubHarvester::new(vec![
        raw_posting("Data Intern", "https://board.test/jobs/1"),
        raw_posting("Design Intern", "https://board.test/jobs/2"),
        raw_posting("Finance Intern", "https://board.test/jobs/3"),
    ]);
    let test_deps = TestDependencies::new().with_harvester(harvester.clone());
    let app = router(&test_deps);
    let token = token(&test_deps, MemberId::new());

    let response = app
        .clone()
        .oneshot(start_scrape(
            &token,
            json!({"jobType": "internships", "location": "perth", "discipline": ""}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let run_id = json_body(response).await["runId"]
        .as_str()
        .unwrap()
        .to_string();

    // EventSource style: token in the query string, no header
    let stream = Request::builder()
        .uri(format!("/api/scrapes/stream?runId={run_id}&token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(stream).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let payloads = sse_payloads(std::str::from_utf8(&bytes).unwrap());

    let postings: Vec<_> = payloads.iter().filter(|p| p["type"] == "posting").collect();
    assert_eq!(postings.len(), 3);
    assert!(postings
        .iter()
        .all(|p| p["link"].is_string() && p["runId"] == run_id.as_str()));
    assert_eq!(postings[0]["tags"]["location"], "perth");
    assert_eq!(postings[0]["tags"]["category"], Value::Null);

    let last = payloads.last().unwrap();
    assert_eq!(last["type"], "complete");
    assert_eq!(last["runId"], run_id.as_str());

    let calls = harvester.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].job_type, "internships");
    assert_eq!(calls[0].location.as_deref(), Some("perth"));
    assert_eq!(calls[0].discipline, None);
}

#[tokio::test]
async fn another_members_run_cannot_be_followed() {
    let test_deps = TestDependencies::new();
    let app = router(&test_deps);
    let owner = token(&test_deps, MemberId::new());

    let response = app
        .clone()
        .oneshot(start_scrape(&owner, json!({"jobType": "internships"})))
        .await
        .unwrap();
    let run_id = json_body(response).await["runId"]
        .as_str()
        .unwrap()
        .to_string();

    let other = token_for_new_member(&test_deps);
    let response = app
        .oneshot(get(&format!("/api/scrapes/stream?runId={run_id}"), &other))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["status"], 403);
}

#[tokio::test(start_paused = true)]
async fn idle_stream_sends_a_ping_frame() {
    let test_deps = TestDependencies::new();
    let token = token(&test_deps, MemberId::new());
    let uri = format!("/api/scrapes/stream?runId={}", ScrapeRunId::new());

    let response = router(&test_deps).oneshot(get(&uri, &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

    let mut frames = response.into_body().into_data_stream();
    let frame = frames.next().await.unwrap().unwrap();
    let frame = std::str::from_utf8(&frame).unwrap();

    assert!(frame.starts_with("event: ping\n"));
    assert_eq!(sse_payloads(frame), vec![json!({"type": "ping"})]);
}

#[tokio::test]
async fn stream_requires_identity() {
    let test_deps = TestDependencies::new();
    let request = Request::builder()
        .uri("/api/scrapes/stream?token=not-a-jwt")
        .body(Body::empty())
        .unwrap();

    let response = router(&test_deps).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

fn stored(owner: MemberId, title: &str, location: &str) -> Posting {
    Posting::builder()
        .owner_id(owner)
        .job_type("internships")
        .location(Some(location.to_string()))
        .title(title)
        .posted_date("Posted today")
        .closing_text("Closing in 5 days")
        .full_text(format!("{title} in {location}"))
        .link(format!("https://board.test/{}", title.replace(' ', "-")))
        .build()
}

#[tokio::test]
async fn postings_search_returns_a_page() {
    let owner = MemberId::new();
    let test_deps = TestDependencies::new().with_postings(vec![
        stored(owner, "Software Engineer", "perth"),
        stored(owner, "Platform Engineer", "perth"),
        stored(owner, "Accountant", "sydney"),
    ]);
    let token = token(&test_deps, owner);

    let response = router(&test_deps)
        .oneshot(get("/api/postings?search=engineer&limit=1", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["hasMore"], true);
    assert_eq!(body["postings"][0]["title"], "Software Engineer");
}

#[tokio::test]
async fn overlong_search_is_a_bad_request() {
    let owner = MemberId::new();
    let test_deps =
        TestDependencies::new().with_postings(vec![stored(owner, "Software Engineer", "perth")]);
    let token = token(&test_deps, owner);
    let uri = format!("/api/postings?search={}", "a".repeat(3000));

    let response = router(&test_deps).oneshot(get(&uri, &token)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("search"));
}

#[tokio::test]
async fn empty_resume_is_a_bad_request() {
    let test_deps = TestDependencies::new();
    let token = token(&test_deps, MemberId::new());
    let request = Request::builder()
        .method("POST")
        .uri("/api/postings/suggestions")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"resumeText": "   "}).to_string()))
        .unwrap();

    let response = router(&test_deps).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reflects_the_store() {
    let test_deps = TestDependencies::new();
    let app = router(&test_deps);

    let healthy = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(healthy.status(), StatusCode::OK);

    test_deps.postings.set_unavailable(true);
    let unhealthy = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(unhealthy.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(unhealthy).await["database"]["status"], "error");
}
