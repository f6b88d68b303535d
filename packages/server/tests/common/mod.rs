// Common test utilities

pub mod harness;

pub use harness::*;

use std::time::Duration;

use server_core::common::ScrapeRunId;
use server_core::domains::scraping::LiveEvent;
use server_core::kernel::LiveEventChannel;

/// Take every queued event of `run_id`, in publish order
pub async fn drain_run(channel: &LiveEventChannel, run_id: ScrapeRunId) -> Vec<LiveEvent> {
    let mut events = Vec::new();
    while let Some(event) = channel
        .next_event(Some(run_id), Duration::from_millis(20))
        .await
    {
        events.push(event);
    }
    events
}

/// Assert the run ended with exactly one completion, published last
pub fn assert_completes_once(events: &[LiveEvent]) {
    let completions = events.iter().filter(|event| event.is_complete()).count();
    assert_eq!(completions, 1, "expected one Complete, got {events:?}");
    assert!(
        events.last().is_some_and(LiveEvent::is_complete),
        "Complete must be the last event: {events:?}"
    );
}
