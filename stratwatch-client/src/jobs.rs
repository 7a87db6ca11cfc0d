//! Job-related API endpoints
//!
//! Public methods resolve the strategy key first and drop it from the cache
//! when the service answers 404, so a recreated strategy is picked up on the
//! next call.

use reqwest::Method;
use stratwatch_core::domain::job::{JobLaunch, TradingMode};
use stratwatch_core::dto::job::{JobStatusResponse, StartJobQuery, StartJobRequest, StopJobRequest};
use stratwatch_core::dto::log::{LogsQuery, LogsRequest, LogsResponse};

use crate::StrategyClient;
use crate::error::{ClientError, Result};

const JOB_STATUS_ENDPOINT: &str = "v2/user/strategy/status";
const JOB_LOGS_ENDPOINT: &str = "v4/user/strategy/logs";
const STRATEGIES_ENDPOINT: &str = "v5/portfolio/strategies";

impl StrategyClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Get the current status of a job
    ///
    /// # Arguments
    /// * `strategy_code` - The strategy code the job was submitted under
    /// * `mode` - The trading mode of the job
    ///
    /// # Returns
    /// The raw status payload; `message` carries the status text
    pub async fn get_job_status(
        &self,
        strategy_code: &str,
        mode: TradingMode,
    ) -> Result<JobStatusResponse> {
        let key = self.strategy_key(strategy_code, mode).await?;
        let result = self.fetch_job_status(&key).await;
        self.forget_key_on_not_found(strategy_code, mode, result)
    }

    /// Ask the service to start a job
    ///
    /// # Arguments
    /// * `strategy_code` - The strategy code to run
    /// * `mode` - The trading mode to run it in
    /// * `launch` - Window, sizing and capital of the run
    pub async fn start_job(
        &self,
        strategy_code: &str,
        mode: TradingMode,
        launch: &JobLaunch,
    ) -> Result<()> {
        if launch.lots == 0 {
            return Err(ClientError::InvalidRequest(
                "lots must be at least 1".to_string(),
            ));
        }
        if launch.end < launch.start {
            return Err(ClientError::InvalidRequest(format!(
                "window end {} precedes start {}",
                launch.end, launch.start
            )));
        }

        let key = self.strategy_key(strategy_code, mode).await?;
        let result = self.send_start(&key, mode, launch).await;
        self.forget_key_on_not_found(strategy_code, mode, result)
    }

    /// Ask the service to stop a running job
    ///
    /// # Arguments
    /// * `strategy_code` - The strategy code the job was submitted under
    /// * `mode` - The trading mode of the job
    pub async fn stop_job(&self, strategy_code: &str, mode: TradingMode) -> Result<()> {
        let key = self.strategy_key(strategy_code, mode).await?;
        let result = self.send_stop(key).await;
        self.forget_key_on_not_found(strategy_code, mode, result)
    }

    // =============================================================================
    // Job Logs
    // =============================================================================

    /// Get one forward page of a job's logs
    ///
    /// # Arguments
    /// * `strategy_code` - The strategy code the job was submitted under
    /// * `mode` - The trading mode of the job
    /// * `cursor` - Forward token of the previous page, `None` to read from the start
    ///
    /// # Returns
    /// The log lines of the page and the token of the next one
    pub async fn get_logs(
        &self,
        strategy_code: &str,
        mode: TradingMode,
        cursor: Option<&str>,
    ) -> Result<LogsResponse> {
        let key = self.strategy_key(strategy_code, mode).await?;
        let result = self.fetch_logs(&key, mode, cursor).await;
        self.forget_key_on_not_found(strategy_code, mode, result)
    }

    async fn fetch_job_status(&self, key: &str) -> Result<JobStatusResponse> {
        let response = self
            .request(Method::GET, JOB_STATUS_ENDPOINT)
            .query(&[("key", key)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    async fn send_start(&self, key: &str, mode: TradingMode, launch: &JobLaunch) -> Result<()> {
        let response = self
            .request(Method::PATCH, STRATEGIES_ENDPOINT)
            .query(&StartJobQuery::new(mode, launch))
            .json(&StartJobRequest::new(key, mode, launch))
            .send()
            .await?;

        let _: serde_json::Value = self.handle_response(response).await?;
        Ok(())
    }

    async fn send_stop(&self, key: String) -> Result<()> {
        let response = self
            .request(Method::PATCH, STRATEGIES_ENDPOINT)
            .json(&StopJobRequest::new(key))
            .send()
            .await?;

        let _: serde_json::Value = self.handle_response(response).await?;
        Ok(())
    }

    async fn fetch_logs(
        &self,
        key: &str,
        mode: TradingMode,
        cursor: Option<&str>,
    ) -> Result<LogsResponse> {
        let query = LogsQuery {
            is_python_build: true,
            is_live: mode == TradingMode::RealTrading,
        };

        let response = self
            .request(Method::POST, JOB_LOGS_ENDPOINT)
            .query(&query)
            .json(&LogsRequest::forward(key, cursor, self.page_size))
            .send()
            .await?;

        self.handle_response(response).await
    }
}
