//! Bounded retry policy for remote calls
//!
//! Every call to the remote job client goes through [`RetryPolicy::execute`].
//! Errors are classified first: transient failures are retried after a fixed
//! delay until the attempt bound is reached, fatal ones are surfaced at once,
//! and protocol anomalies are handed back to the caller to degrade. The same
//! bound caps consecutive anomalies of a call site across calls, so a service
//! that never answers sensibly still ends the session.

use std::future::Future;
use std::time::Duration;

use stratwatch_client::ClientError;
use stratwatch_core::domain::job::JobHandle;
use tracing::{error, info, warn};

use crate::config::RetryConfig;
use crate::error::{CallSite, MonitorError, Result};

/// How a failed remote call should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected to clear on its own; retry
    Transient,
    /// Retrying cannot help; surface immediately
    Fatal,
    /// The service answered with something unexpected; degrade, don't crash
    Protocol,
}

/// Classification function used by a [`RetryPolicy`]
pub type Classifier = fn(&ClientError) -> ErrorClass;

/// Default classification of client errors
pub fn classify(err: &ClientError) -> ErrorClass {
    if err.is_transient() {
        ErrorClass::Transient
    } else if err.is_protocol() {
        ErrorClass::Protocol
    } else {
        ErrorClass::Fatal
    }
}

/// Successful outcome of a call wrapped in the retry policy
#[derive(Debug)]
pub enum Retried<T> {
    Value(T),
    /// The call failed with a protocol-class error the caller must degrade
    Anomaly(ClientError),
}

/// Per-call-site failure counters of one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryLedger {
    status_failures: u32,
    log_failures: u32,
    status_anomalies: u32,
    log_anomalies: u32,
    total_retries: u32,
}

impl RetryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consecutive transient failures of a call site since its last success
    pub fn consecutive_failures(&self, call: CallSite) -> u32 {
        match call {
            CallSite::JobStatus => self.status_failures,
            CallSite::LogBatch => self.log_failures,
        }
    }

    /// Consecutive undecodable responses of a call site since its last success
    pub fn consecutive_anomalies(&self, call: CallSite) -> u32 {
        match call {
            CallSite::JobStatus => self.status_anomalies,
            CallSite::LogBatch => self.log_anomalies,
        }
    }

    /// Retries performed over the whole session, across call sites
    pub fn total_retries(&self) -> u32 {
        self.total_retries
    }

    fn counters(&mut self, call: CallSite) -> (&mut u32, &mut u32) {
        match call {
            CallSite::JobStatus => (&mut self.status_failures, &mut self.status_anomalies),
            CallSite::LogBatch => (&mut self.log_failures, &mut self.log_anomalies),
        }
    }

    fn record_retry(&mut self, call: CallSite) {
        *self.counters(call).0 += 1;
        self.total_retries += 1;
    }

    fn record_anomaly(&mut self, call: CallSite) -> u32 {
        let (failures, anomalies) = self.counters(call);
        *failures = 0;
        *anomalies += 1;
        *anomalies
    }

    fn reset(&mut self, call: CallSite) {
        let (failures, anomalies) = self.counters(call);
        *failures = 0;
        *anomalies = 0;
    }
}

/// Retry policy with an injectable attempt bound and classifier
///
/// One instance can serve status polls and log fetches alike; the failure
/// counters live in the caller's [`RetryLedger`], keyed by call site.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    classify: Classifier,
}

impl RetryPolicy {
    /// Creates a policy using the default classifier
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: config.delay,
            classify,
        }
    }

    /// Replaces the error classifier
    pub fn with_classifier(mut self, classify: Classifier) -> Self {
        self.classify = classify;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `operation` until it succeeds, fails fatally, or runs out of attempts
    ///
    /// # Arguments
    /// * `call` - Which remote call this is, for logs and errors
    /// * `job` - The job the call is about, for logs and errors
    /// * `ledger` - The session's failure counters
    /// * `operation` - Produces one attempt of the call
    ///
    /// # Returns
    /// The call's value, or the protocol anomaly it raised. Fatal errors,
    /// exhausted transient errors and a run of `max_attempts` consecutive
    /// anomalies are returned as [`MonitorError`].
    pub async fn execute<T, F, Fut>(
        &self,
        call: CallSite,
        job: &JobHandle,
        ledger: &mut RetryLedger,
        mut operation: F,
    ) -> Result<Retried<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = stratwatch_client::Result<T>>,
    {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let err = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!("{} for {} succeeded after {} attempts", call, job, attempt);
                    }
                    ledger.reset(call);
                    return Ok(Retried::Value(value));
                }
                Err(err) => err,
            };

            match (self.classify)(&err) {
                ErrorClass::Protocol => {
                    let responses = ledger.record_anomaly(call);
                    if responses >= self.max_attempts {
                        error!(
                            "{} for {} returned {} malformed responses in a row: {}",
                            call, job, responses, err
                        );
                        return Err(MonitorError::Malformed {
                            call,
                            job: job.clone(),
                            responses,
                            source: err,
                        });
                    }
                    return Ok(Retried::Anomaly(err));
                }
                ErrorClass::Fatal => {
                    error!("{} for {} failed: {}", call, job, err);
                    return Err(MonitorError::remote(call, job, err));
                }
                ErrorClass::Transient if attempt >= self.max_attempts => {
                    error!(
                        "{} for {} still failing after {} attempts: {}",
                        call, job, attempt, err
                    );
                    return Err(MonitorError::RetriesExhausted {
                        call,
                        job: job.clone(),
                        attempts: attempt,
                        source: err,
                    });
                }
                ErrorClass::Transient => {
                    ledger.record_retry(call);
                    warn!(
                        "{} for {} failed (attempt {}/{}), retrying in {:?}: {}",
                        call, job, attempt, self.max_attempts, self.delay, err
                    );
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}
