//! Pagination, de-duplication and failure handling of the harvest loop,
//! driven through the mock fetcher.

use std::sync::Arc;

use harvester::{
    HarvestError, HarvestOptions, Harvester, MockFetcher, MockFetcherFactory, SearchQuery,
};
use pretty_assertions::assert_eq;

const BASE: &str = "https://board.test";
const PAGE_1: &str = "https://board.test/internships/perth/";
const PAGE_2: &str = "https://board.test/internships/perth/?page=2";
const PAGE_3: &str = "https://board.test/internships/perth/?page=3";

fn results_page(links: &[&str]) -> String {
    let cards: String = links
        .iter()
        .map(|link| {
            format!(
                r#"<div class="campaign-box"><a class="box-header-title" href="{}">Job {}</a></div>"#,
                link, link
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", cards)
}

fn detail_page(title: &str) -> String {
    format!(
        r#"<html><body>
             <h1 class="employers-profile-h1">{}</h1>
             <span class="job-info-header-closing-in">Closing in 3 days</span>
             <div class="campaign-content-container"><p>About the role.</p></div>
           </body></html>"#,
        title
    )
}

fn harvester(factory: &MockFetcherFactory) -> Harvester {
    Harvester::new(Arc::new(factory.clone()), BASE).unwrap()
}

fn query() -> SearchQuery {
    SearchQuery::new("internships").with_location("perth")
}

#[tokio::test]
async fn stops_at_first_page_without_cards() {
    let fetcher = MockFetcher::new()
        .with_results_page(PAGE_1, &results_page(&["/jobs/a", "/jobs/b"]))
        .with_detail_page("https://board.test/jobs/a", &detail_page("A"))
        .with_detail_page("https://board.test/jobs/b", &detail_page("B"));
    let factory = MockFetcherFactory::new(fetcher);

    let postings = harvester(&factory)
        .fetch_listings(&query(), HarvestOptions::new(5))
        .await
        .unwrap();

    assert_eq!(
        postings.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(),
        vec!["A", "B"]
    );
    // Page 2 rendered no cards, so pages 3..5 were never requested
    assert_eq!(factory.fetcher().results_calls(), vec![PAGE_1, PAGE_2]);
    assert_eq!(factory.fetcher().shutdown_count(), 1);
}

#[tokio::test]
async fn respects_max_pages() {
    let fetcher = MockFetcher::new()
        .with_results_page(PAGE_1, &results_page(&["/jobs/a"]))
        .with_results_page(PAGE_2, &results_page(&["/jobs/b"]))
        .with_results_page(PAGE_3, &results_page(&["/jobs/c"]))
        .with_detail_page("https://board.test/jobs/a", &detail_page("A"))
        .with_detail_page("https://board.test/jobs/b", &detail_page("B"))
        .with_detail_page("https://board.test/jobs/c", &detail_page("C"));
    let factory = MockFetcherFactory::new(fetcher);

    let postings = harvester(&factory)
        .fetch_listings(&query(), HarvestOptions::new(2))
        .await
        .unwrap();

    assert_eq!(postings.len(), 2);
    assert_eq!(factory.fetcher().results_calls(), vec![PAGE_1, PAGE_2]);
}

#[tokio::test]
async fn links_seen_on_earlier_pages_are_not_revisited() {
    let fetcher = MockFetcher::new()
        .with_results_page(PAGE_1, &results_page(&["/jobs/a", "/jobs/a", "/jobs/b"]))
        .with_results_page(PAGE_2, &results_page(&["/jobs/b", "/jobs/c"]))
        .with_detail_page("https://board.test/jobs/a", &detail_page("A"))
        .with_detail_page("https://board.test/jobs/b", &detail_page("B"))
        .with_detail_page("https://board.test/jobs/c", &detail_page("C"));
    let factory = MockFetcherFactory::new(fetcher);

    let postings = harvester(&factory)
        .fetch_listings(&query(), HarvestOptions::new(3))
        .await
        .unwrap();

    let links: Vec<_> = postings.iter().map(|p| p.link.as_str()).collect();
    assert_eq!(
        links,
        vec![
            "https://board.test/jobs/a",
            "https://board.test/jobs/b",
            "https://board.test/jobs/c"
        ]
    );
    assert_eq!(factory.fetcher().detail_calls().len(), 3);
}

#[tokio::test]
async fn failing_listing_is_skipped() {
    let fetcher = MockFetcher::new()
        .with_results_page(PAGE_1, &results_page(&["/jobs/a", "/jobs/broken", "/jobs/b"]))
        .with_detail_page("https://board.test/jobs/a", &detail_page("A"))
        .with_detail_page("https://board.test/jobs/b", &detail_page("B"))
        .failing("https://board.test/jobs/broken");
    let factory = MockFetcherFactory::new(fetcher);

    let postings = harvester(&factory)
        .fetch_listings(&query(), HarvestOptions::new(1))
        .await
        .unwrap();

    assert_eq!(
        postings.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(),
        vec!["A", "B"]
    );
}

#[tokio::test]
async fn unreadable_detail_tab_skips_only_that_listing() {
    let fetcher = MockFetcher::new()
        .with_results_page(PAGE_1, &results_page(&["/jobs/a", "/jobs/crashed"]))
        .with_results_page(PAGE_2, &results_page(&["/jobs/b"]))
        .with_detail_page("https://board.test/jobs/a", &detail_page("A"))
        .with_detail_page("https://board.test/jobs/crashed", &detail_page("Crashed"))
        .with_detail_page("https://board.test/jobs/b", &detail_page("B"))
        .unreadable("https://board.test/jobs/crashed");
    let factory = MockFetcherFactory::new(fetcher);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let summary = harvester(&factory)
        .stream_listings(&query(), HarvestOptions::new(2), tx)
        .await
        .unwrap();

    assert_eq!(summary.listings_failed, 1);
    assert_eq!(summary.postings, 2);
    let mut titles = Vec::new();
    while let Some(posting) = rx.recv().await {
        titles.push(posting.title);
    }
    assert_eq!(titles, vec!["A", "B"]);
    assert_eq!(factory.fetcher().results_calls(), vec![PAGE_1, PAGE_2]);
}

#[tokio::test]
async fn failing_results_page_ends_pagination_without_error() {
    let fetcher = MockFetcher::new()
        .with_results_page(PAGE_1, &results_page(&["/jobs/a"]))
        .with_detail_page("https://board.test/jobs/a", &detail_page("A"))
        .failing(PAGE_2);
    let factory = MockFetcherFactory::new(fetcher);

    let postings = harvester(&factory)
        .fetch_listings(&query(), HarvestOptions::new(3))
        .await
        .unwrap();

    assert_eq!(postings.len(), 1);
    assert_eq!(factory.fetcher().results_calls(), vec![PAGE_1, PAGE_2]);
}

#[tokio::test]
async fn lost_session_aborts_but_still_shuts_down() {
    let fetcher = MockFetcher::new()
        .with_results_page(PAGE_1, &results_page(&["/jobs/a", "/jobs/b"]))
        .with_detail_page("https://board.test/jobs/a", &detail_page("A"))
        .losing_session_at("https://board.test/jobs/b");
    let factory = MockFetcherFactory::new(fetcher);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let result = harvester(&factory)
        .stream_listings(&query(), HarvestOptions::new(2), tx)
        .await;

    assert!(matches!(result, Err(HarvestError::Session(_))));
    // The posting extracted before the failure was already delivered
    assert_eq!(rx.recv().await.map(|p| p.title), Some("A".to_string()));
    assert!(rx.recv().await.is_none());
    assert_eq!(factory.fetcher().shutdown_count(), 1);
}

#[tokio::test]
async fn unavailable_browser_is_a_session_error() {
    let factory = MockFetcherFactory::unavailable();

    let result = harvester(&factory)
        .fetch_listings(&query(), HarvestOptions::new(1))
        .await;

    assert!(matches!(result, Err(HarvestError::Session(_))));
}
