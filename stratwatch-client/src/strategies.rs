//! Strategy key endpoints

use reqwest::Method;
use stratwatch_core::domain::job::TradingMode;
use stratwatch_core::dto::job::{StrategyKeyRequest, StrategyKeyResponse};
use tracing::debug;

use crate::StrategyClient;
use crate::error::Result;

const STRATEGY_KEY_ENDPOINT: &str = "v2/portfolio/strategy";

/// HTTP method the key endpoint expects for each mode
fn key_method(mode: TradingMode) -> Method {
    match mode {
        TradingMode::RealTrading => Method::POST,
        TradingMode::PaperTrading => Method::PUT,
        TradingMode::Backtesting => Method::PATCH,
    }
}

impl StrategyClient {
    // =============================================================================
    // Strategy Keys
    // =============================================================================

    /// Get the server-side key of a strategy in the given mode
    ///
    /// The key is fetched on first use and served from the client's cache
    /// afterwards.
    ///
    /// # Arguments
    /// * `strategy_code` - The strategy code the job was submitted under
    /// * `mode` - The trading mode of the job
    pub async fn strategy_key(&self, strategy_code: &str, mode: TradingMode) -> Result<String> {
        if let Some(key) = self.keys.get(strategy_code, mode) {
            return Ok(key);
        }

        let key = self.fetch_strategy_key(strategy_code, mode).await?;
        self.keys.insert(strategy_code, mode, key.clone());
        Ok(key)
    }

    async fn fetch_strategy_key(&self, strategy_code: &str, mode: TradingMode) -> Result<String> {
        debug!("Fetching {} key for strategy {}", mode, strategy_code);

        let response = self
            .request(key_method(mode), STRATEGY_KEY_ENDPOINT)
            .json(&StrategyKeyRequest::new(strategy_code, mode))
            .send()
            .await?;

        let body: StrategyKeyResponse = self.handle_response(response).await?;
        Ok(body.key)
    }

    /// Drop the cached key when the service no longer recognizes it
    pub(crate) fn forget_key_on_not_found<T>(
        &self,
        strategy_code: &str,
        mode: TradingMode,
        result: Result<T>,
    ) -> Result<T> {
        if let Err(e) = &result {
            if e.is_not_found() && self.keys.invalidate(strategy_code, mode).is_some() {
                debug!(
                    "Dropped cached {} key for strategy {} after 404",
                    mode, strategy_code
                );
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientError;

    #[test]
    fn test_key_method_per_mode() {
        assert_eq!(key_method(TradingMode::RealTrading), Method::POST);
        assert_eq!(key_method(TradingMode::PaperTrading), Method::PUT);
        assert_eq!(key_method(TradingMode::Backtesting), Method::PATCH);
    }

    #[tokio::test]
    async fn test_cached_key_is_served_without_request() {
        // Unroutable base URL: any network call would fail
        let client = StrategyClient::new("http://127.0.0.1:1");
        client
            .keys()
            .insert("s1", TradingMode::Backtesting, "cached".into());

        let key = client
            .strategy_key("s1", TradingMode::Backtesting)
            .await
            .unwrap();
        assert_eq!(key, "cached");
    }

    #[test]
    fn test_not_found_invalidates_key() {
        let client = StrategyClient::new("http://127.0.0.1:1");
        client
            .keys()
            .insert("s1", TradingMode::PaperTrading, "stale".into());

        let result: Result<()> = client.forget_key_on_not_found(
            "s1",
            TradingMode::PaperTrading,
            Err(ClientError::from_status(404, "gone")),
        );
        assert!(result.is_err());
        assert!(client.keys().is_empty());
    }

    #[test]
    fn test_other_errors_keep_key() {
        let client = StrategyClient::new("http://127.0.0.1:1");
        client
            .keys()
            .insert("s1", TradingMode::PaperTrading, "fresh".into());

        let _: Result<()> = client.forget_key_on_not_found(
            "s1",
            TradingMode::PaperTrading,
            Err(ClientError::from_status(504, "slow")),
        );
        assert_eq!(client.keys().len(), 1);
    }
}
