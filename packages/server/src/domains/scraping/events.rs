//! Live events published by scrape runs.
//!
//! Ephemeral: they only live in the live event channel until a stream
//! subscriber takes them. Every event carries the id of the run that produced
//! it.

use serde::{Deserialize, Serialize};

use crate::common::ScrapeRunId;
use crate::domains::postings::data::PostingData;

/// Status string carried by every completion event
pub const STATUS_COMPLETE: &str = "complete";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// One posting was persisted
    #[serde(rename = "posting")]
    PostingUpdate(PostingUpdate),
    /// The run finished; always the last event of a run
    Complete(RunComplete),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingUpdate {
    pub run_id: ScrapeRunId,
    #[serde(flatten)]
    pub posting: PostingData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunComplete {
    pub run_id: ScrapeRunId,
    pub status: String,
}

impl LiveEvent {
    pub fn posting(run_id: ScrapeRunId, posting: PostingData) -> Self {
        Self::PostingUpdate(PostingUpdate { run_id, posting })
    }

    pub fn complete(run_id: ScrapeRunId) -> Self {
        Self::Complete(RunComplete {
            run_id,
            status: STATUS_COMPLETE.to_string(),
        })
    }

    pub fn run_id(&self) -> ScrapeRunId {
        match self {
            Self::PostingUpdate(update) => update.run_id,
            Self::Complete(complete) => complete.run_id,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// SSE event name, same as the payload's `type`
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::PostingUpdate(_) => "posting",
            Self::Complete(_) => "complete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::postings::data::PostingTags;
    use serde_json::json;

    #[test]
    fn complete_event_wire_format() {
        let run_id = ScrapeRunId::nil();
        let value = serde_json::to_value(LiveEvent::complete(run_id)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "complete",
                "runId": "00000000-0000-0000-0000-000000000000",
                "status": "complete"
            })
        );
    }

    #[test]
    fn posting_event_flattens_the_posting() {
        let event = LiveEvent::posting(
            ScrapeRunId::nil(),
            PostingData {
                title: "Intern".into(),
                company: "".into(),
                posted_date: "n/a".into(),
                closing_text: "n/a".into(),
                closing_at: None,
                ai_summary: None,
                link: "https://board.test/jobs/1".into(),
                tags: PostingTags {
                    location: None,
                    job_type: "internships".into(),
                    category: None,
                },
            },
        );

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "posting");
        assert_eq!(value["runId"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(value["link"], "https://board.test/jobs/1");
        assert_eq!(value["tags"]["jobType"], "internships");
        assert_eq!(event.event_name(), "posting");
        assert!(!event.is_complete());
    }
}
