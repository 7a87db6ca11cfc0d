//! Progress reporting
//!
//! Maps the position of a job within its declared window to a completion
//! fraction and pushes status, log and progress events to a sink.
//!
//! Paper and real trading jobs progress with the wall clock, read through an
//! injected [`Clock`]. Backtests replay history much faster than real time,
//! so their position is the latest timestamp found in their log lines.
//!
//! A wall-clock job given only an end bound is measured from the instant it
//! was first seen running.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use stratwatch_core::domain::job::{ExecutionStatus, JobWindow, TradingMode};
use stratwatch_core::domain::log::LogEntry;
use tracing::debug;

use crate::sink::{MonitorSink, Progress};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Tracks and reports the progress of one job
pub struct ProgressReporter {
    mode: TradingMode,
    window: JobWindow,
    clock: Arc<dyn Clock>,
    status: Option<ExecutionStatus>,
    started_at: Option<DateTime<Utc>>,
    latest_log_time: Option<DateTime<Utc>>,
    last_line: Option<String>,
}

impl ProgressReporter {
    pub fn new(mode: TradingMode, window: JobWindow, clock: Arc<dyn Clock>) -> Self {
        Self {
            mode,
            window,
            clock,
            status: None,
            started_at: None,
            latest_log_time: None,
            last_line: None,
        }
    }

    /// Records an observed status and reports it if it changed
    ///
    /// The first `Started` marks the progress start instant, whether or not a
    /// `Starting` was seen before it.
    pub fn on_status(&mut self, status: ExecutionStatus, sink: &mut dyn MonitorSink) {
        if self.status == Some(status) {
            return;
        }
        self.status = Some(status);

        if status == ExecutionStatus::Started && self.started_at.is_none() {
            let now = self.clock.now();
            debug!("Progress start marked at {}", now);
            self.started_at = Some(now);
        }

        sink.on_status(status);
        sink.on_progress(&self.progress());
    }

    /// Delivers new log lines and the resulting progress
    pub fn on_entries(&mut self, entries: &[LogEntry], sink: &mut dyn MonitorSink) {
        if entries.is_empty() {
            return;
        }

        for entry in entries {
            sink.on_log_line(entry);

            if entry.mode_tag().is_some() {
                if let Some(at) = entry.timestamp() {
                    self.latest_log_time = Some(self.latest_log_time.map_or(at, |t| t.max(at)));
                }
            }
        }

        self.last_line = entries.last().map(|entry| entry.text.clone());
        sink.on_progress(&self.progress());
    }

    /// Fraction of the window elapsed at `now`, `None` when unknowable
    pub fn elapsed_fraction(&self, now: DateTime<Utc>) -> Option<f64> {
        self.effective_window().fraction_at(now)
    }

    /// Window progress is measured against
    fn effective_window(&self) -> JobWindow {
        match self.mode {
            TradingMode::Backtesting => self.window,
            TradingMode::PaperTrading | TradingMode::RealTrading => JobWindow {
                start: self.window.start.or(self.started_at),
                end: self.window.end,
            },
        }
    }

    /// Current progress snapshot
    pub fn progress(&self) -> Progress {
        Progress {
            fraction: self.current_fraction(),
            last_line: self.last_line.clone(),
        }
    }

    /// Instant the job was first seen running
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    fn current_fraction(&self) -> Option<f64> {
        if !self.effective_window().is_bounded() {
            return None;
        }

        match self.status {
            Some(ExecutionStatus::Stopped) => return Some(1.0),
            None | Some(ExecutionStatus::Starting) => return Some(0.0),
            _ => {}
        }

        match self.mode {
            TradingMode::Backtesting => match self.latest_log_time {
                Some(at) => self.elapsed_fraction(at),
                None => Some(0.0),
            },
            TradingMode::PaperTrading | TradingMode::RealTrading => {
                self.elapsed_fraction(self.clock.now())
            }
        }
    }
}
