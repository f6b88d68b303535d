//! Closing-date normalization.
//!
//! Job boards show relative deadlines ("Closing in 12 days", "Closing in an
//! hour"). These are turned into an absolute deadline plus a canonical display
//! string. Rules are tried in a fixed order and the first hit wins:
//!
//! 1. "an hour" → 1 hour
//! 2. `N hour(s)` → N hours
//! 3. "a day" → 1 day
//! 4. `N day(s)` → N days
//! 5. "a month" → 1 month
//! 6. `N month(s)` → N months, counted as 30 days each
//!
//! Hour-granularity deadlines resolve to the reference date itself. Text that
//! matches no rule (including the "n/a" placeholder) passes through unchanged
//! with no deadline.

use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HOURS: Regex = Regex::new(r"(\d+)\s*hours?").unwrap();
    static ref DAYS: Regex = Regex::new(r"(\d+)\s*days?").unwrap();
    static ref MONTHS: Regex = Regex::new(r"(\d+)\s*months?").unwrap();
}

const DAYS_PER_MONTH: i64 = 30;

/// Result of normalizing a closing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosingDate {
    pub closes_at: Option<DateTime<Utc>>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Hour,
    Day,
    Month,
}

impl Unit {
    fn label(self, n: u32) -> &'static str {
        match (self, n == 1) {
            (Unit::Hour, true) => "hour",
            (Unit::Hour, false) => "hours",
            (Unit::Day, true) => "day",
            (Unit::Day, false) => "days",
            (Unit::Month, true) => "month",
            (Unit::Month, false) => "months",
        }
    }

    fn offset(self, n: u32) -> Option<Duration> {
        match self {
            // The deadline falls on the reference date
            Unit::Hour => Some(Duration::zero()),
            Unit::Day => Duration::try_days(i64::from(n)),
            Unit::Month => Duration::try_days(i64::from(n) * DAYS_PER_MONTH),
        }
    }
}

/// Normalize `text` relative to `now`.
pub fn normalize_closing(text: &str, now: DateTime<Utc>) -> ClosingDate {
    let lowered = text.to_lowercase();

    let Some((n, unit)) = relative_amount(&lowered) else {
        return passthrough(text);
    };

    let closes_at = unit
        .offset(n)
        .and_then(|offset| now.checked_add_signed(offset));

    match closes_at {
        Some(closes_at) => ClosingDate {
            closes_at: Some(closes_at),
            text: format!("Closing in {} {}", n, unit.label(n)),
        },
        None => passthrough(text),
    }
}

fn relative_amount(lowered: &str) -> Option<(u32, Unit)> {
    if lowered.contains("an hour") {
        return Some((1, Unit::Hour));
    }
    if let Some(n) = captured_number(&HOURS, lowered) {
        return Some((n, Unit::Hour));
    }
    if lowered.contains("a day") {
        return Some((1, Unit::Day));
    }
    if let Some(n) = captured_number(&DAYS, lowered) {
        return Some((n, Unit::Day));
    }
    if lowered.contains("a month") {
        return Some((1, Unit::Month));
    }
    captured_number(&MONTHS, lowered).map(|n| (n, Unit::Month))
}

/// `None` when absent or too large to be a real deadline.
fn captured_number(pattern: &Regex, text: &str) -> Option<u32> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn passthrough(text: &str) -> ClosingDate {
    ClosingDate {
        closes_at: None,
        text: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn days_are_added_to_the_reference_date() {
        let closing = normalize_closing("Closing in 12 days", now());
        assert_eq!(closing.closes_at, Some(now() + Duration::days(12)));
        assert_eq!(closing.text, "Closing in 12 days");
    }

    #[test]
    fn single_day_phrase() {
        let closing = normalize_closing("Closing in a day", now());
        assert_eq!(closing.closes_at, Some(now() + Duration::days(1)));
        assert_eq!(closing.text, "Closing in 1 day");
    }

    #[test]
    fn hours_resolve_to_the_same_day() {
        let closing = normalize_closing("Closing in 5 hours", now());
        assert_eq!(closing.closes_at, Some(now()));
        assert_eq!(closing.text, "Closing in 5 hours");

        let closing = normalize_closing("Closing in an hour", now());
        assert_eq!(closing.closes_at, Some(now()));
        assert_eq!(closing.text, "Closing in 1 hour");
    }

    #[test]
    fn months_count_as_thirty_days() {
        let closing = normalize_closing("Closing in 2 months", now());
        assert_eq!(closing.closes_at, Some(now() + Duration::days(60)));
        assert_eq!(closing.text, "Closing in 2 months");

        let closing = normalize_closing("Closing in a month", now());
        assert_eq!(closing.closes_at, Some(now() + Duration::days(30)));
        assert_eq!(closing.text, "Closing in 1 month");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let closing = normalize_closing("CLOSING IN 3 DAYS", now());
        assert_eq!(closing.closes_at, Some(now() + Duration::days(3)));
        assert_eq!(closing.text, "Closing in 3 days");
    }

    #[test]
    fn hour_rules_win_over_day_rules() {
        let closing = normalize_closing("Closing in 1 day 4 hours", now());
        assert_eq!(closing.closes_at, Some(now()));
        assert_eq!(closing.text, "Closing in 4 hours");
    }

    #[test]
    fn placeholder_passes_through() {
        let closing = normalize_closing("n/a", now());
        assert_eq!(closing.closes_at, None);
        assert_eq!(closing.text, "n/a");
    }

    #[test]
    fn unrecognized_text_passes_through_verbatim() {
        let closing = normalize_closing("Applications open all year", now());
        assert_eq!(closing.closes_at, None);
        assert_eq!(closing.text, "Applications open all year");
    }

    #[test]
    fn absurd_amounts_pass_through() {
        let closing = normalize_closing("Closing in 99999999999 days", now());
        assert_eq!(closing.closes_at, None);
        assert_eq!(closing.text, "Closing in 99999999999 days");
    }
}
