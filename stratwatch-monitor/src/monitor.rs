//! Monitor entry point

use std::sync::Arc;

use stratwatch_client::RemoteJobClient;
use stratwatch_core::domain::job::{JobHandle, JobWindow};
use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::progress::{Clock, SystemClock};
use crate::retry::{Classifier, RetryPolicy};
use crate::session::{MonitorOutcome, Session};
use crate::sink::{MonitorSink, NullSink};

/// Watches remote strategy jobs until their log stream is drained
///
/// A `Monitor` holds no per-job state; every call to [`Monitor::run`] starts
/// a fresh session, so one instance can watch any number of jobs in turn.
pub struct Monitor {
    client: Arc<dyn RemoteJobClient>,
    config: MonitorConfig,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl Monitor {
    pub fn new(client: Arc<dyn RemoteJobClient>, config: MonitorConfig) -> Self {
        let policy = RetryPolicy::new(&config.retry);
        Self {
            client,
            config,
            policy,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used for wall-clock progress
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces how remote errors are classified for retrying
    pub fn with_classifier(mut self, classify: Classifier) -> Self {
        self.policy = self.policy.with_classifier(classify);
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Monitors a job, streaming everything observed into `sink`
    ///
    /// Returns once the job is stopped and its log stream drained, or once
    /// `cancel` fires. A fatal remote error, or a transient one that outlasts
    /// the retry budget, ends the session with an error.
    pub async fn run(
        &self,
        handle: JobHandle,
        window: JobWindow,
        sink: &mut dyn MonitorSink,
        cancel: &CancellationToken,
    ) -> Result<MonitorOutcome> {
        Session::new(
            Arc::clone(&self.client),
            &self.policy,
            self.config.poll_interval,
            Arc::clone(&self.clock),
            handle,
            window,
        )
        .run(sink, cancel)
        .await
    }

    /// Reads a job's log stream up to its current end without polling status
    ///
    /// Every page goes through the retry policy. Reading stops at the first
    /// page that brings nothing new and no further cursor. The outcome's
    /// status is `Unknown` since the job itself is never polled.
    pub async fn read_logs(
        &self,
        handle: JobHandle,
        sink: &mut dyn MonitorSink,
        cancel: &CancellationToken,
    ) -> Result<MonitorOutcome> {
        Session::new(
            Arc::clone(&self.client),
            &self.policy,
            self.config.poll_interval,
            Arc::clone(&self.clock),
            handle,
            JobWindow::default(),
        )
        .logs_only()
        .run(sink, cancel)
        .await
    }

    /// Monitors a job to completion and returns everything it logged
    pub async fn collect(&self, handle: JobHandle, window: JobWindow) -> Result<MonitorOutcome> {
        self.run(handle, window, &mut NullSink, &CancellationToken::new())
            .await
    }
}
