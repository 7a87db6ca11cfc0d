//! Log domain types

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::job::TradingMode;

/// Format of the timestamp the remote service appends to log lines
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One line of remote-produced output
///
/// Lines usually look like `[BT] message [2024-03-01 09:15:00]`. When the
/// trailing timestamp is present it is kept as the entry's sequence hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub text: String,
    pub sequence_hint: Option<String>,
}

impl LogEntry {
    /// Creates an entry from a raw line, extracting its trailing timestamp
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let sequence_hint = trailing_timestamp(&text).map(str::to_string);
        Self {
            text,
            sequence_hint,
        }
    }

    /// Mode tag the line starts with, if any
    pub fn mode_tag(&self) -> Option<TradingMode> {
        let rest = self.text.trim_start().strip_prefix('[')?;
        let (tag, _) = rest.split_once(']')?;
        TradingMode::from_log_tag(tag)
    }

    /// Timestamp carried by the line, interpreted as UTC
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let hint = self.sequence_hint.as_deref()?;
        NaiveDateTime::parse_from_str(hint, LOG_TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

fn trailing_timestamp(text: &str) -> Option<&str> {
    let body = text.trim_end().strip_suffix(']')?;
    let open = body.rfind('[')?;
    let candidate = &body[open + 1..];
    NaiveDateTime::parse_from_str(candidate, LOG_TIMESTAMP_FORMAT)
        .ok()
        .map(|_| candidate)
}

/// One page of the remote log stream
///
/// A missing `next_cursor` means "nothing further right now", not "stream
/// ended". Only an empty page without a cursor marks the stream as exhausted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogBatch {
    pub entries: Vec<LogEntry>,
    pub next_cursor: Option<String>,
}

impl LogBatch {
    /// Creates a batch, treating an empty cursor string as absent
    pub fn new(entries: Vec<LogEntry>, next_cursor: Option<String>) -> Self {
        Self {
            entries,
            next_cursor: next_cursor.filter(|c| !c.is_empty()),
        }
    }

    pub fn from_lines<I, S>(lines: I, next_cursor: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(lines.into_iter().map(LogEntry::new).collect(), next_cursor)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// No entries and no cursor to follow
    pub fn is_exhausted(&self) -> bool {
        self.entries.is_empty() && self.next_cursor.is_none()
    }
}
