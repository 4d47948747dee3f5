//! Cursor disciplines that decide which lines of a full read are new.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// Leading timestamps understood by the timestamp cursor, e.g.
/// `2011-08-31 15:27:11.328` and `2011/08/31 15:27:11.328`.
static LOG_TIME_FORMATS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2}) (\d{2}):(\d{2}):(\d{2})\.(\d{3})")
            .expect("dash timestamp pattern is valid"),
        Regex::new(r"^(\d{4})/(\d{2})/(\d{2}) (\d{2}):(\d{2}):(\d{2})\.(\d{3})")
            .expect("slash timestamp pattern is valid"),
    ]
});

/// Lines older than this many hours, relative to the scan clock, are never
/// reported.
pub const STALENESS_HORIZON_HOURS: i64 = 24;

/// Which cursor discipline a watched file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorMode {
    #[default]
    Timestamp,
    LineCount,
}

/// How much of a file has already been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailCursor {
    /// Newest embedded log timestamp seen so far.
    Timestamp { last_seen: Option<NaiveDateTime> },
    /// Number of lines the file had at the previous read.
    LineCount { consumed: usize },
}

impl TailCursor {
    pub fn new(mode: CursorMode) -> Self {
        match mode {
            CursorMode::Timestamp => TailCursor::Timestamp { last_seen: None },
            CursorMode::LineCount => TailCursor::LineCount { consumed: 0 },
        }
    }

    pub fn mode(&self) -> CursorMode {
        match self {
            TailCursor::Timestamp { .. } => CursorMode::Timestamp,
            TailCursor::LineCount { .. } => CursorMode::LineCount,
        }
    }

    /// Timestamp of the newest line consumed, for timestamp cursors.
    pub fn last_seen(&self) -> Option<NaiveDateTime> {
        match self {
            TailCursor::Timestamp { last_seen } => *last_seen,
            TailCursor::LineCount { .. } => None,
        }
    }

    /// Takes the complete current content of a file, returns the lines not
    /// consumed before and moves the cursor past everything read.
    pub fn advance(&mut self, lines: Vec<String>, now: NaiveDateTime) -> Vec<String> {
        match self {
            TailCursor::Timestamp { last_seen } => {
                let horizon = now - TimeDelta::hours(STALENESS_HORIZON_HOURS);
                let mut newest = None;
                let mut fresh = Vec::new();

                for line in lines {
                    let Some(time) = parse_log_time(&line) else {
                        continue;
                    };
                    newest = newest.max(Some(time));
                    if last_seen.is_none_or(|seen| time > seen) && time > horizon {
                        fresh.push(line);
                    }
                }

                // Stale lines still move the cursor so they are not rescanned.
                *last_seen = (*last_seen).max(newest);
                fresh
            }
            TailCursor::LineCount { consumed } => {
                let total = lines.len();
                // Fewer lines than before: rotated or truncated, start over.
                let skip = if total < *consumed { 0 } else { *consumed };
                *consumed = total;
                lines.into_iter().skip(skip).collect()
            }
        }
    }
}

/// Parses the timestamp a log line starts with, as local wall-clock time.
pub fn parse_log_time(line: &str) -> Option<NaiveDateTime> {
    let caps = LOG_TIME_FORMATS.iter().find_map(|re| re.captures(line))?;
    let field = |i: usize| caps[i].parse::<u32>().ok();

    let year = caps[1].parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?
        .and_hms_milli_opt(field(4)?, field(5)?, field(6)?, field(7)?)
}
