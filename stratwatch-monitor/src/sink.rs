//! Monitor sinks
//!
//! A sink receives everything a monitoring session observes: log lines as
//! they arrive, status changes, and progress updates. Sinks are pure side
//! effects; nothing they do feeds back into the session loop.

use stratwatch_core::domain::job::ExecutionStatus;
use stratwatch_core::domain::log::LogEntry;
use tracing::info;

/// Snapshot of a job's progress
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Elapsed fraction of the job's window, `None` when it cannot be known
    pub fraction: Option<f64>,
    /// Most recent log line, if any
    pub last_line: Option<String>,
}

/// Receiver of session events
///
/// All methods default to doing nothing, so implementations only override
/// what they care about.
pub trait MonitorSink: Send {
    /// Called once per new log line, in stream order
    fn on_log_line(&mut self, _entry: &LogEntry) {}

    /// Called when the observed status changes
    fn on_status(&mut self, _status: ExecutionStatus) {}

    /// Called after status changes and after each batch of new lines
    fn on_progress(&mut self, _progress: &Progress) {}
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MonitorSink for NullSink {}

/// Sink that forwards events to `tracing`
#[derive(Debug, Clone)]
pub struct TracingSink {
    job: String,
}

impl TracingSink {
    pub fn new(job: impl Into<String>) -> Self {
        Self { job: job.into() }
    }
}

impl MonitorSink for TracingSink {
    fn on_log_line(&mut self, entry: &LogEntry) {
        info!(target: "stratwatch::job_log", job = %self.job, "{}", entry.text);
    }

    fn on_status(&mut self, status: ExecutionStatus) {
        info!(job = %self.job, "Job status: {}", status);
    }

    fn on_progress(&mut self, progress: &Progress) {
        if let Some(fraction) = progress.fraction {
            info!(job = %self.job, "Progress: {:.1}%", fraction * 100.0);
        }
    }
}

/// Sink that records every event, mainly for tests and notebooks
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    pub lines: Vec<String>,
    pub statuses: Vec<ExecutionStatus>,
    pub progress: Vec<Progress>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MonitorSink for CollectingSink {
    fn on_log_line(&mut self, entry: &LogEntry) {
        self.lines.push(entry.text.clone());
    }

    fn on_status(&mut self, status: ExecutionStatus) {
        self.statuses.push(status);
    }

    fn on_progress(&mut self, progress: &Progress) {
        self.progress.push(progress.clone());
    }
}

/// Sink calling a closure for every log line
pub struct LineSink<F> {
    on_line: F,
}

impl<F> LineSink<F>
where
    F: FnMut(&LogEntry) + Send,
{
    pub fn new(on_line: F) -> Self {
        Self { on_line }
    }
}

impl<F> MonitorSink for LineSink<F>
where
    F: FnMut(&LogEntry) + Send,
{
    fn on_log_line(&mut self, entry: &LogEntry) {
        (self.on_line)(entry)
    }
}

/// Sink calling a closure for every progress update
pub struct ProgressFn<F> {
    on_progress: F,
}

impl<F> ProgressFn<F>
where
    F: FnMut(Option<f64>, Option<&str>) + Send,
{
    pub fn new(on_progress: F) -> Self {
        Self { on_progress }
    }
}

impl<F> MonitorSink for ProgressFn<F>
where
    F: FnMut(Option<f64>, Option<&str>) + Send,
{
    fn on_progress(&mut self, progress: &Progress) {
        (self.on_progress)(progress.fraction, progress.last_line.as_deref())
    }
}

/// Fans events out to two sinks
pub struct Tee<A, B>(pub A, pub B);

impl<A: MonitorSink, B: MonitorSink> MonitorSink for Tee<A, B> {
    fn on_log_line(&mut self, entry: &LogEntry) {
        self.0.on_log_line(entry);
        self.1.on_log_line(entry);
    }

    fn on_status(&mut self, status: ExecutionStatus) {
        self.0.on_status(status);
        self.1.on_status(status);
    }

    fn on_progress(&mut self, progress: &Progress) {
        self.0.on_progress(progress);
        self.1.on_progress(progress);
    }
}
