//! Remote job seam
//!
//! The monitor never talks HTTP directly; it observes a job through this
//! trait so tests can script every status and log page deterministically.

use async_trait::async_trait;
use stratwatch_core::domain::job::JobHandle;
use stratwatch_core::domain::log::LogBatch;

use crate::StrategyClient;
use crate::error::Result;

/// Read access to a remote job's status and log stream
#[async_trait]
pub trait RemoteJobClient: Send + Sync {
    /// Fetches the raw status text of the job
    ///
    /// # Arguments
    /// * `handle` - The job to query
    async fn job_status(&self, handle: &JobHandle) -> Result<String>;

    /// Fetches the page of log lines that follows `cursor`
    ///
    /// # Arguments
    /// * `handle` - The job to query
    /// * `cursor` - Position to read from, `None` for the start of the stream
    async fn log_batch(&self, handle: &JobHandle, cursor: Option<&str>) -> Result<LogBatch>;
}

#[async_trait]
impl RemoteJobClient for StrategyClient {
    async fn job_status(&self, handle: &JobHandle) -> Result<String> {
        let response = self
            .get_job_status(handle.job_key(), handle.mode())
            .await?;
        Ok(response.message)
    }

    async fn log_batch(&self, handle: &JobHandle, cursor: Option<&str>) -> Result<LogBatch> {
        let response = self
            .get_logs(handle.job_key(), handle.mode(), cursor)
            .await?;
        Ok(LogBatch::from(response))
    }
}
