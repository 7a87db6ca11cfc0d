//! Stratwatch Monitor
//!
//! Watches a remote strategy job from the client side: polls its lifecycle
//! status, pages through its log stream without losing or repeating lines,
//! retries transient remote failures within a bounded budget, and reports
//! progress to a pluggable sink.
//!
//! This crate contains:
//! - Monitor: Entry point running one session per job
//! - Session: The polling state machine
//! - Retry: Error classification and the bounded retry policy
//! - Sinks: Receivers of log lines, status changes and progress

pub mod config;
pub mod cursor;
pub mod error;
pub mod monitor;
pub mod progress;
pub mod retry;
pub mod session;
pub mod sink;
pub mod status;

#[cfg(test)]
mod mock;

pub use config::{MonitorConfig, RetryConfig};
pub use error::{CallSite, MonitorError, Result};
pub use monitor::Monitor;
pub use progress::{Clock, ManualClock, SystemClock};
pub use retry::{Classifier, ErrorClass, RetryPolicy};
pub use session::{MonitorOutcome, SessionState};
pub use sink::{CollectingSink, LineSink, MonitorSink, NullSink, Progress, ProgressFn, Tee, TracingSink};
