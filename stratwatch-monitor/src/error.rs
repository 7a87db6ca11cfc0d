//! Error types for the monitor

use std::fmt;

use stratwatch_client::ClientError;
use stratwatch_core::domain::job::JobHandle;
use thiserror::Error;

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Remote call a failure originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallSite {
    JobStatus,
    LogBatch,
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallSite::JobStatus => f.write_str("job status poll"),
            CallSite::LogBatch => f.write_str("log batch fetch"),
        }
    }
}

/// Errors that end a monitoring session
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Invalid job handle: {0}")]
    InvalidHandle(String),

    #[error("Invalid job window: {0}")]
    InvalidWindow(String),

    /// The remote service rejected a call with a non-retryable error
    #[error("{call} failed for {job}: {source}")]
    Remote {
        call: CallSite,
        job: JobHandle,
        #[source]
        source: ClientError,
    },

    /// A transient failure persisted through every allowed attempt
    #[error("{call} failed for {job} after {attempts} attempts: {source}")]
    RetriesExhausted {
        call: CallSite,
        job: JobHandle,
        attempts: u32,
        #[source]
        source: ClientError,
    },

    /// The service kept answering in a shape the client cannot decode
    #[error("{call} for {job} returned {responses} malformed responses in a row: {source}")]
    Malformed {
        call: CallSite,
        job: JobHandle,
        responses: u32,
        #[source]
        source: ClientError,
    },
}

impl MonitorError {
    pub fn remote(call: CallSite, job: &JobHandle, source: ClientError) -> Self {
        Self::Remote {
            call,
            job: job.clone(),
            source,
        }
    }

    /// Remote call the error originated from, if any
    pub fn call_site(&self) -> Option<CallSite> {
        match self {
            Self::Remote { call, .. }
            | Self::RetriesExhausted { call, .. }
            | Self::Malformed { call, .. } => Some(*call),
            _ => None,
        }
    }

    /// Underlying client error, if any
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            Self::Remote { source, .. }
            | Self::RetriesExhausted { source, .. }
            | Self::Malformed { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Fatal remote failures, including exhausted retries and repeated anomalies
    pub fn is_fatal_remote(&self) -> bool {
        self.client_error().is_some()
    }
}
