//! Monitoring session
//!
//! A session drives one job through `Init -> Polling -> Draining -> Done`,
//! with `Cancelled` reachable from `Polling` and `Draining`.
//!
//! Each polling iteration performs one status poll and at most one log fetch,
//! then pauses. Once `Stopped` is observed the session keeps fetching until a
//! page brings nothing new and no further cursor, so lines produced right
//! before the status flipped are not lost. Cancellation is checked between
//! iterations only; a retry sequence in flight always runs to its end first.
//!
//! A logs-only session skips status polling and starts in `Draining`, which
//! reads whatever the stream holds right now through the same retry policy.

use std::sync::Arc;
use std::time::Duration;

use stratwatch_client::RemoteJobClient;
use stratwatch_core::domain::job::{ExecutionStatus, JobHandle, JobWindow};
use stratwatch_core::domain::log::LogEntry;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cursor::{Advance, LogCursor};
use crate::error::{CallSite, MonitorError, Result};
use crate::progress::{Clock, ProgressReporter};
use crate::retry::{Retried, RetryLedger, RetryPolicy};
use crate::sink::MonitorSink;
use crate::status::StatusTracker;

/// Lifecycle state of a monitoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Polling,
    Draining,
    Done,
    Cancelled,
}

/// What a finished session observed
#[derive(Debug, Clone)]
pub struct MonitorOutcome {
    /// Last observed status (`Unknown` if none was observed)
    pub status: ExecutionStatus,
    /// `Done` or `Cancelled`
    pub state: SessionState,
    /// Every delivered log entry, in stream order
    pub logs: Vec<LogEntry>,
    /// Transient failures retried over the session
    pub retries: u32,
    /// Log stream position reached
    pub cursor: Option<String>,
}

impl MonitorOutcome {
    /// All delivered log lines joined by newlines
    pub fn log_text(&self) -> String {
        self.logs
            .iter()
            .map(|entry| entry.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether the job was observed to the end of its log stream
    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Done
    }
}

/// Session-local state, discarded when the session ends
struct PollingContext {
    handle: JobHandle,
    window: JobWindow,
    state: SessionState,
    tracker: StatusTracker,
    cursor: LogCursor,
    retries: RetryLedger,
    logs: Vec<LogEntry>,
}

impl PollingContext {
    fn validate(&self) -> Result<()> {
        if self.handle.job_key().trim().is_empty() {
            return Err(MonitorError::InvalidHandle(
                "job key must not be empty".to_string(),
            ));
        }

        if !self.window.is_valid() {
            return Err(MonitorError::InvalidWindow(format!(
                "end {:?} precedes start {:?}",
                self.window.end, self.window.start
            )));
        }

        Ok(())
    }
}

pub(crate) struct Session<'a> {
    policy: &'a RetryPolicy,
    poll_interval: Duration,
    /// Skip status polling and read the log stream to its current end
    logs_only: bool,
    reporter: ProgressReporter,
    context: PollingContext,
}

impl<'a> Session<'a> {
    pub(crate) fn new(
        client: Arc<dyn RemoteJobClient>,
        policy: &'a RetryPolicy,
        poll_interval: Duration,
        clock: Arc<dyn Clock>,
        handle: JobHandle,
        window: JobWindow,
    ) -> Self {
        let reporter = ProgressReporter::new(handle.mode(), window, clock);
        let context = PollingContext {
            tracker: StatusTracker::new(Arc::clone(&client), handle.clone()),
            cursor: LogCursor::new(client, handle.clone()),
            handle,
            window,
            state: SessionState::Init,
            retries: RetryLedger::new(),
            logs: Vec::new(),
        };

        Self {
            policy,
            poll_interval,
            logs_only: false,
            reporter,
            context,
        }
    }

    /// Reads what the log stream holds right now instead of following the job
    pub(crate) fn logs_only(mut self) -> Self {
        self.logs_only = true;
        self
    }

    /// Runs the session to `Done` or `Cancelled`
    pub(crate) async fn run(
        mut self,
        sink: &mut dyn MonitorSink,
        cancel: &CancellationToken,
    ) -> Result<MonitorOutcome> {
        loop {
            match self.context.state {
                SessionState::Init => {
                    self.context.validate()?;
                    info!(
                        "Monitoring {} (poll interval: {:?})",
                        self.context.handle, self.poll_interval
                    );
                    self.context.state = if self.logs_only {
                        SessionState::Draining
                    } else {
                        SessionState::Polling
                    };
                }
                SessionState::Polling => {
                    if self.cancel_requested(cancel) {
                        continue;
                    }

                    let status = self.poll_status().await?;
                    self.reporter.on_status(status, sink);

                    if status.is_terminal() {
                        info!(
                            "{} stopped, draining remaining logs",
                            self.context.handle
                        );
                        self.context.state = SessionState::Draining;
                        continue;
                    }

                    if self.should_fetch(status) {
                        self.fetch_batch(sink).await?;
                    } else {
                        debug!("{} is {}, not fetching logs yet", self.context.handle, status);
                    }

                    self.pause(cancel).await;
                }
                SessionState::Draining => {
                    if self.cancel_requested(cancel) {
                        continue;
                    }

                    let advance = self.fetch_batch(sink).await?;
                    if advance.exhausted {
                        info!(
                            "Log stream of {} drained ({} entries)",
                            self.context.handle,
                            self.context.logs.len()
                        );
                        self.context.state = SessionState::Done;
                    } else if advance.entries.is_empty() {
                        self.pause(cancel).await;
                    }
                }
                SessionState::Done | SessionState::Cancelled => return Ok(self.finish()),
            }
        }
    }

    fn cancel_requested(&mut self, cancel: &CancellationToken) -> bool {
        if !cancel.is_cancelled() {
            return false;
        }

        info!(
            "Monitoring of {} cancelled after {} entries",
            self.context.handle,
            self.context.logs.len()
        );
        self.context.state = SessionState::Cancelled;
        true
    }

    /// Logs are not expected while the job is still starting up
    fn should_fetch(&self, status: ExecutionStatus) -> bool {
        match status {
            ExecutionStatus::Starting => false,
            ExecutionStatus::Unknown => self.context.tracker.has_started(),
            _ => true,
        }
    }

    async fn poll_status(&mut self) -> Result<ExecutionStatus> {
        let ctx = &mut self.context;
        let tracker = &ctx.tracker;

        let polled = self
            .policy
            .execute(CallSite::JobStatus, &ctx.handle, &mut ctx.retries, move || {
                tracker.poll()
            })
            .await?;

        let status = match polled {
            Retried::Value(status) => status,
            Retried::Anomaly(err) => {
                warn!(
                    "Unreadable status for {}, treating as {}: {}",
                    ctx.handle,
                    ExecutionStatus::Unknown,
                    err
                );
                ExecutionStatus::Unknown
            }
        };

        ctx.tracker.observe(status);
        Ok(status)
    }

    async fn fetch_batch(&mut self, sink: &mut dyn MonitorSink) -> Result<Advance> {
        let ctx = &mut self.context;
        let cursor = &ctx.cursor;

        let fetched = self
            .policy
            .execute(CallSite::LogBatch, &ctx.handle, &mut ctx.retries, move || {
                cursor.fetch_next()
            })
            .await?;

        let batch = match fetched {
            Retried::Value(batch) => batch,
            Retried::Anomaly(err) => {
                warn!(
                    "Malformed log page for {}, treating it as empty: {}",
                    ctx.handle, err
                );
                return Ok(Advance::default());
            }
        };

        let advance = ctx.cursor.apply(batch);
        if !advance.entries.is_empty() {
            debug!(
                "Received {} log entries for {}",
                advance.entries.len(),
                ctx.handle
            );
            self.reporter.on_entries(&advance.entries, sink);
            ctx.logs.extend(advance.entries.iter().cloned());
        }

        Ok(advance)
    }

    async fn pause(&self, cancel: &CancellationToken) {
        if self.poll_interval.is_zero() {
            tokio::task::yield_now().await;
            return;
        }

        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(self.poll_interval) => {}
        }
    }

    fn finish(self) -> MonitorOutcome {
        let ctx = self.context;
        MonitorOutcome {
            status: ctx.tracker.last().unwrap_or(ExecutionStatus::Unknown),
            state: ctx.state,
            retries: ctx.retries.total_retries(),
            cursor: ctx.cursor.position().map(str::to_string),
            logs: ctx.logs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::mock::ScriptedClient;
    use crate::progress::SystemClock;
    use crate::sink::NullSink;
    use chrono::{TimeZone, Utc};
    use stratwatch_core::domain::job::TradingMode;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(&RetryConfig {
            max_attempts: 5,
            delay: Duration::ZERO,
        })
    }

    fn session<'a>(
        client: ScriptedClient,
        policy: &'a RetryPolicy,
        handle: JobHandle,
        window: JobWindow,
    ) -> Session<'a> {
        Session::new(
            Arc::new(client),
            policy,
            Duration::ZERO,
            Arc::new(SystemClock),
            handle,
            window,
        )
    }

    #[tokio::test]
    async fn test_empty_job_key_is_rejected_before_any_call() {
        let policy = policy();
        let session = session(
            ScriptedClient::new(),
            &policy,
            JobHandle::new("  ", TradingMode::Backtesting),
            JobWindow::default(),
        );

        let result = session.run(&mut NullSink, &CancellationToken::new()).await;
        assert!(matches!(result, Err(MonitorError::InvalidHandle(_))));
    }

    #[tokio::test]
    async fn test_inverted_window_is_rejected() {
        let policy = policy();
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 17, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let session = session(
            ScriptedClient::new(),
            &policy,
            JobHandle::new("s1", TradingMode::PaperTrading),
            JobWindow::new(start, end),
        );

        let result = session.run(&mut NullSink, &CancellationToken::new()).await;
        assert!(matches!(result, Err(MonitorError::InvalidWindow(_))));
    }

    #[test]
    fn test_outcome_log_text() {
        let outcome = MonitorOutcome {
            status: ExecutionStatus::Stopped,
            state: SessionState::Done,
            logs: vec![LogEntry::new("L1"), LogEntry::new("L2")],
            retries: 0,
            cursor: None,
        };
        assert_eq!(outcome.log_text(), "L1\nL2");
        assert!(outcome.is_complete());
    }
}
