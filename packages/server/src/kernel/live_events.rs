//! Process-wide channel carrying live events from scrape runs to stream
//! subscribers.
//!
//! One instance is built in the composition root and shared by every run and
//! every subscriber. Runs publish into a single FIFO queue; subscribers take
//! events out of it.
//!
//! A subscriber either takes events of one run (`Some(run_id)`), leaving other
//! runs' events queued for their own subscribers, or takes whatever is at the
//! head of the queue (`None`).
//!
//! The queue is bounded: when full, the oldest posting update is dropped to
//! make room. Completion events are only dropped when nothing else is queued.
//! Publishing never blocks.
//!
//! The channel also remembers which member started each run, until that run's
//! completion event is taken.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::stream::{self, Stream};
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::warn;

use crate::common::{MemberId, ScrapeRunId};
use crate::domains::scraping::events::LiveEvent;

pub const DEFAULT_CAPACITY: usize = 10_000;

/// What a stream subscriber sends next
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    Event(LiveEvent),
    /// Nothing arrived within the wait
    Ping,
}

#[derive(Clone)]
pub struct LiveEventChannel {
    inner: Arc<Inner>,
}

struct Inner {
    queue: Mutex<VecDeque<LiveEvent>>,
    owners: Mutex<HashMap<ScrapeRunId, MemberId>>,
    published: Notify,
    capacity: usize,
}

impl LiveEventChannel {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: Mutex::new(VecDeque::new()),
                owners: Mutex::new(HashMap::new()),
                published: Notify::new(),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Remember who started `run_id`.
    pub fn register_run(&self, run_id: ScrapeRunId, owner_id: MemberId) {
        self.owners().insert(run_id, owner_id);
    }

    /// Member that started `run_id`, while its completion is still pending.
    pub fn run_owner(&self, run_id: ScrapeRunId) -> Option<MemberId> {
        self.owners().get(&run_id).copied()
    }

    /// Append an event, evicting the oldest posting update if the queue is full.
    pub fn publish(&self, event: LiveEvent) {
        {
            let mut queue = self.lock();
            if queue.len() >= self.inner.capacity {
                let victim = queue
                    .iter()
                    .position(|queued| !queued.is_complete())
                    .unwrap_or(0);
                if let Some(dropped) = queue.remove(victim) {
                    warn!(
                        run_id = %dropped.run_id(),
                        event = dropped.event_name(),
                        capacity = self.inner.capacity,
                        "live event channel full, dropping oldest event"
                    );
                    if dropped.is_complete() {
                        self.owners().remove(&dropped.run_id());
                    }
                }
            }
            queue.push_back(event);
        }
        self.inner.published.notify_waiters();
    }

    /// Wait up to `wait` for the next event matching `run_id`.
    ///
    /// Dropping the returned future before it resolves dequeues nothing.
    pub async fn next_event(&self, run_id: Option<ScrapeRunId>, wait: Duration) -> Option<LiveEvent> {
        let deadline = Instant::now() + wait;

        loop {
            let published = self.inner.published.notified();
            tokio::pin!(published);
            // Register before checking, so a publish in between is not missed
            published.as_mut().enable();

            if let Some(event) = self.take(run_id) {
                return Some(event);
            }

            if tokio::time::timeout_at(deadline, published).await.is_err() {
                return self.take(run_id);
            }
        }
    }

    /// Stream of messages for one subscriber: events as they arrive, a ping
    /// after every `wait` without one, ending after the first completion event.
    pub fn subscribe(
        &self,
        run_id: Option<ScrapeRunId>,
        wait: Duration,
    ) -> impl Stream<Item = StreamMessage> + Send + 'static {
        let channel = self.clone();

        stream::unfold(false, move |finished| {
            let channel = channel.clone();
            async move {
                if finished {
                    return None;
                }
                match channel.next_event(run_id, wait).await {
                    Some(event) => {
                        let finished = event.is_complete();
                        Some((StreamMessage::Event(event), finished))
                    }
                    None => Some((StreamMessage::Ping, false)),
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn take(&self, run_id: Option<ScrapeRunId>) -> Option<LiveEvent> {
        let mut queue = self.lock();
        let position = match run_id {
            None => 0,
            Some(run_id) => queue.iter().position(|event| event.run_id() == run_id)?,
        };
        let event = queue.remove(position)?;
        if event.is_complete() {
            self.owners().remove(&event.run_id());
        }
        Some(event)
    }

    fn owners(&self) -> MutexGuard<'_, HashMap<ScrapeRunId, MemberId>> {
        self.inner
            .owners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LiveEvent>> {
        // A panic while holding the lock cannot leave the queue half-updated
        self.inner
            .queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for LiveEventChannel {
    fn default() -> Self {
        Self::new()
    }
}
