//! Monitor configuration
//!
//! Defines the polling cadence and the retry bounds applied to every remote
//! call made while a job is being watched.

use std::time::Duration;

/// Upper bound on the delay between two attempts of one call
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Retry bounds for a single remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts per call, including the first one
    pub max_attempts: u32,

    /// Fixed delay between two attempts
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Pause between two iterations of the session loop
    pub poll_interval: Duration,

    /// Retry bounds for status polls and log fetches
    pub retry: RetryConfig,
}

impl MonitorConfig {
    /// Creates a new configuration with defaults
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            retry: RetryConfig::default(),
        }
    }

    /// Configuration without any pauses, for tests and replays
    pub fn immediate() -> Self {
        Self {
            poll_interval: Duration::ZERO,
            retry: RetryConfig {
                delay: Duration::ZERO,
                ..RetryConfig::default()
            },
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - STRATWATCH_POLL_INTERVAL_MS (default: 2000)
    /// - STRATWATCH_RETRY_ATTEMPTS (default: 5)
    /// - STRATWATCH_RETRY_DELAY_MS (default: 1000)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::new();

        let poll_interval = env_parse::<u64>("STRATWATCH_POLL_INTERVAL_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        let max_attempts =
            env_parse::<u32>("STRATWATCH_RETRY_ATTEMPTS")?.unwrap_or(defaults.retry.max_attempts);

        let delay = env_parse::<u64>("STRATWATCH_RETRY_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry.delay);

        Ok(Self {
            poll_interval,
            retry: RetryConfig {
                max_attempts,
                delay,
            },
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }

        if self.retry.delay > MAX_RETRY_DELAY {
            anyhow::bail!(
                "retry.delay must not exceed {}s",
                MAX_RETRY_DELAY.as_secs()
            );
        }

        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn env_parse<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", name, raw, e)),
        Err(_) => Ok(None),
    }
}
