//! Per-member sliding-window request limiter.
//!
//! Each `(member, action)` key keeps the timestamps of its accepted requests.
//! A check prunes timestamps that fell out of the window, rejects if the
//! remaining count is at the cap, and otherwise records the request.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::BaseClock;
use crate::common::MemberId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateAction {
    StartScrape,
    SuggestPostings,
}

impl std::fmt::Display for RateAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateAction::StartScrape => write!(f, "start_scrape"),
            RateAction::SuggestPostings => write!(f, "suggest_postings"),
        }
    }
}

/// At most `max_requests` per trailing `window`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    pub max_requests: usize,
    pub window: Duration,
}

impl RatePolicy {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    pub fn per_hour(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(3600))
    }
}

type WindowKey = (MemberId, RateAction);

pub struct RateGate {
    policies: HashMap<RateAction, RatePolicy>,
    windows: Mutex<HashMap<WindowKey, VecDeque<DateTime<Utc>>>>,
    clock: Arc<dyn BaseClock>,
}

impl RateGate {
    pub fn new(clock: Arc<dyn BaseClock>) -> Self {
        Self {
            policies: HashMap::new(),
            windows: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn with_policy(mut self, action: RateAction, policy: RatePolicy) -> Self {
        self.policies.insert(action, policy);
        self
    }

    /// Record and accept the request, or reject it if the window is full.
    /// Actions without a policy are always accepted.
    pub fn allow(&self, member_id: MemberId, action: RateAction) -> bool {
        let Some(policy) = self.policies.get(&action) else {
            return true;
        };

        let now = self.clock.now();
        let window = chrono::Duration::from_std(policy.window).unwrap_or(chrono::Duration::MAX);
        let cutoff = now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let timestamps = windows.entry((member_id, action)).or_default();

        while timestamps.front().is_some_and(|at| *at <= cutoff) {
            timestamps.pop_front();
        }

        if timestamps.len() >= policy.max_requests {
            debug!(member_id = %member_id, action = %action, "rate limit reached");
            return false;
        }

        timestamps.push_back(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::ManualClock;

    fn gate(clock: &Arc<ManualClock>) -> RateGate {
        RateGate::new(clock.clone()).with_policy(RateAction::StartScrape, RatePolicy::per_hour(5))
    }

    #[test]
    fn sixth_request_in_the_window_is_rejected() {
        let clock = Arc::new(ManualClock::default());
        let gate = gate(&clock);
        let member = MemberId::new();

        for _ in 0..5 {
            assert!(gate.allow(member, RateAction::StartScrape));
            clock.advance(Duration::from_secs(60));
        }
        assert!(!gate.allow(member, RateAction::StartScrape));
        assert!(!gate.allow(member, RateAction::StartScrape));
    }

    #[test]
    fn window_slides_past_old_requests() {
        let clock = Arc::new(ManualClock::default());
        let gate = gate(&clock);
        let member = MemberId::new();

        for _ in 0..5 {
            assert!(gate.allow(member, RateAction::StartScrape));
        }
        assert!(!gate.allow(member, RateAction::StartScrape));

        clock.advance(Duration::from_secs(3601));
        assert!(gate.allow(member, RateAction::StartScrape));
    }

    #[test]
    fn rejected_requests_do_not_extend_the_window() {
        let clock = Arc::new(ManualClock::default());
        let gate = gate(&clock);
        let member = MemberId::new();

        for _ in 0..5 {
            gate.allow(member, RateAction::StartScrape);
        }
        clock.advance(Duration::from_secs(1800));
        assert!(!gate.allow(member, RateAction::StartScrape));

        clock.advance(Duration::from_secs(1801));
        assert!(gate.allow(member, RateAction::StartScrape));
    }

    #[test]
    fn members_and_actions_have_separate_windows() {
        let clock = Arc::new(ManualClock::default());
        let gate = gate(&clock)
            .with_policy(RateAction::SuggestPostings, RatePolicy::per_hour(1));
        let (alice, bob) = (MemberId::new(), MemberId::new());

        for _ in 0..5 {
            gate.allow(alice, RateAction::StartScrape);
        }
        assert!(!gate.allow(alice, RateAction::StartScrape));
        assert!(gate.allow(bob, RateAction::StartScrape));
        assert!(gate.allow(alice, RateAction::SuggestPostings));
        assert!(!gate.allow(alice, RateAction::SuggestPostings));
    }

    #[test]
    fn unconfigured_action_is_unlimited() {
        let clock = Arc::new(ManualClock::default());
        let gate = RateGate::new(clock);
        let member = MemberId::new();
        for _ in 0..100 {
            assert!(gate.allow(member, RateAction::SuggestPostings));
        }
    }

    #[test]
    fn concurrent_checks_never_exceed_the_cap() {
        let clock = Arc::new(ManualClock::default());
        let gate = Arc::new(gate(&clock));
        let member = MemberId::new();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let gate = gate.clone();
                std::thread::spawn(move || gate.allow(member, RateAction::StartScrape))
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|accepted| *accepted)
            .count();

        assert_eq!(accepted, 5);
    }
}
