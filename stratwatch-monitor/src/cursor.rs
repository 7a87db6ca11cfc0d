//! Log stream cursor
//!
//! Holds the pagination position of a job's log stream and turns fetched
//! pages into entries the consumer has not seen yet.
//!
//! The cursor moves only when a fetched page is applied; a failed fetch leaves
//! it untouched, so a retry asks for the same range again. Pages returned
//! without a next cursor keep the position, and the entries already delivered
//! from that position are skipped when the service returns them again.

use std::sync::Arc;

use stratwatch_client::RemoteJobClient;
use stratwatch_core::domain::job::JobHandle;
use stratwatch_core::domain::log::{LogBatch, LogEntry};
use tracing::{debug, warn};

/// Result of applying one fetched page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Advance {
    /// Entries not delivered before, in server order
    pub entries: Vec<LogEntry>,
    /// Leading entries skipped because they were already delivered
    pub replayed: usize,
    /// Nothing new and no further position to read from
    pub exhausted: bool,
}

/// Pagination state of one job's log stream
pub struct LogCursor {
    client: Arc<dyn RemoteJobClient>,
    handle: JobHandle,
    position: Option<String>,
    delivered_here: Vec<String>,
}

impl LogCursor {
    /// Creates a cursor positioned at the start of the stream
    pub fn new(client: Arc<dyn RemoteJobClient>, handle: JobHandle) -> Self {
        Self {
            client,
            handle,
            position: None,
            delivered_here: Vec::new(),
        }
    }

    /// Current position, `None` meaning the start of the stream
    pub fn position(&self) -> Option<&str> {
        self.position.as_deref()
    }

    /// Fetches the page at the current position
    ///
    /// Performs one remote call and leaves the cursor unchanged; pass the
    /// page to [`LogCursor::apply`] to advance.
    pub async fn fetch_next(&self) -> stratwatch_client::Result<LogBatch> {
        self.client
            .log_batch(&self.handle, self.position.as_deref())
            .await
    }

    /// Applies a successfully fetched page
    pub fn apply(&mut self, batch: LogBatch) -> Advance {
        let LogBatch {
            entries,
            next_cursor,
        } = batch;

        let replayed = entries
            .iter()
            .zip(&self.delivered_here)
            .take_while(|(entry, seen)| entry.text == **seen)
            .count();
        let fresh: Vec<LogEntry> = entries.into_iter().skip(replayed).collect();

        if replayed > 0 {
            debug!(
                "Skipped {} already delivered log entries for {}",
                replayed, self.handle
            );
        }

        let advanced = match next_cursor {
            Some(next) if self.position.as_deref() != Some(next.as_str()) => {
                self.position = Some(next);
                self.delivered_here.clear();
                true
            }
            _ => {
                if !fresh.is_empty() {
                    warn!(
                        "Log page for {} carried {} new entries without a new cursor",
                        self.handle,
                        fresh.len()
                    );
                }
                self.delivered_here
                    .extend(fresh.iter().map(|entry| entry.text.clone()));
                false
            }
        };

        Advance {
            exhausted: fresh.is_empty() && !advanced,
            entries: fresh,
            replayed,
        }
    }
}
