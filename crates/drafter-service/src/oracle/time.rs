//! Timestamp handling for oracle output.
//!
//! ## Summary
//! A time is only ever accepted when it carries an explicit clock time.
//! Date-only values, weekday names and relative words never parse, and
//! [`mentions_clock_time`] lets callers reject times the user never said.

use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use regex::Regex;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

fn re_clock_time() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ix)
            \b\d{1,2}(?::\d{2})?\s*[ap]\.?\s?m\b
            | \b\d{1,2}:\d{2}\b
            | \b(?:noon|midnight|midday)\b
            | o'clock
            | \bat\s+\d{1,2}
              (?: \s*(?:$|[.,;!?])
                | \s+(?:tomorrow|today|tonight|sharp|on|this|next
                       |in\s+the\s+(?:morning|afternoon|evening))\b )
            ",
        )
        .unwrap_or_else(|e| unreachable!("clock time pattern is valid: {e}"))
    })
}

/// Returns true when `text` contains an explicit clock-time expression such
/// as `3pm`, `3:30 p.m.`, `15:00`, `noon` or a clause-final `at 9`.
#[must_use]
pub fn mentions_clock_time(text: &str) -> bool {
    re_clock_time().is_match(text)
}

/// ## Summary
/// Parses an oracle-supplied timestamp.
///
/// RFC 3339 values keep their offset. Naive `YYYY-MM-DD[T ]HH:MM[:SS]`
/// values are interpreted in `tz`; for ambiguous local times the earlier
/// instant wins and non-existent local times are rejected.
#[must_use]
pub fn parse_time(value: &str, tz: Tz) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed);
    }
    if let Ok(parsed) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M%:z") {
        return Some(parsed);
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.fixed_offset())
}
