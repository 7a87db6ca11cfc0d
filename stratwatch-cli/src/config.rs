//! Configuration module
//!
//! Handles CLI configuration: where the strategy API lives and how to
//! authenticate against it.

use anyhow::{Context, Result};
use stratwatch_client::StrategyClient;
use stratwatch_monitor::MonitorConfig;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the strategy API
    pub api_url: String,
    /// Access token, if one was provided
    pub access_token: Option<String>,
}

impl Config {
    /// Build an API client from this configuration
    pub fn client(&self) -> StrategyClient {
        let mut client = StrategyClient::new(&self.api_url);
        if let Some(token) = &self.access_token {
            client.set_access_token(token);
        }
        client
    }

    /// Monitor settings, read from the environment
    pub fn monitor_config(&self) -> Result<MonitorConfig> {
        let config = MonitorConfig::from_env().context("Failed to read monitor settings")?;
        config.validate().context("Invalid monitor settings")?;
        Ok(config)
    }
}
