//! Stratwatch HTTP Client
//!
//! A type-safe HTTP client for the remote strategy execution API.
//!
//! The client resolves and caches the server-side key of each
//! `(strategy, mode)` pair, maps HTTP status codes to [`ClientError`]
//! variants, and implements [`RemoteJobClient`], the seam the monitor uses to
//! observe a running job.
//!
//! # Example
//!
//! ```no_run
//! use stratwatch_client::StrategyClient;
//! use stratwatch_core::domain::job::TradingMode;
//!
//! #[tokio::main]
//! async fn main() -> stratwatch_client::Result<()> {
//!     let mut client = StrategyClient::new("https://api.example.com");
//!     client.set_access_token("token");
//!
//!     let status = client
//!         .get_job_status("my-strategy", TradingMode::Backtesting)
//!         .await?;
//!
//!     println!("Job status: {}", status.message);
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
pub mod key_cache;
mod remote;
mod strategies;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use key_cache::KeyCache;
pub use remote::RemoteJobClient;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Default number of log lines requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// HTTP client for the remote strategy API
///
/// Cloning is cheap; clones share the HTTP connection pool and the strategy
/// key cache.
#[derive(Debug, Clone)]
pub struct StrategyClient {
    /// Base URL of the API (e.g., "https://api.example.com")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Raw developer access token sent in the Authorization header
    access_token: Option<String>,
    /// Number of log lines requested per page
    page_size: u32,
    /// Server-side keys per (strategy code, mode)
    keys: Arc<KeyCache>,
}

impl StrategyClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the API (e.g., "https://api.example.com")
    ///
    /// # Example
    /// ```
    /// use stratwatch_client::StrategyClient;
    ///
    /// let client = StrategyClient::new("https://api.example.com/");
    /// assert_eq!(client.base_url(), "https://api.example.com");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the API
    /// * `client` - A configured reqwest Client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            access_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            keys: Arc::new(KeyCache::new()),
        }
    }

    /// Set the access token sent with every request
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = Some(token.into());
    }

    /// Set the number of log lines requested per page
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Strategy keys resolved so far
    pub fn keys(&self) -> &KeyCache {
        &self.keys
    }

    // =============================================================================
    // Request Helpers
    // =============================================================================

    /// Build a request for an endpoint path relative to the base URL
    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        let builder = self.client.request(method, &url);

        match &self.access_token {
            Some(token) => builder.header(AUTHORIZATION, token.as_str()),
            None => builder,
        }
    }

    /// Handle an API response and deserialize JSON
    ///
    /// This method maps the status code to the matching [`ClientError`] if the
    /// request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::from_status(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = StrategyClient::new("https://api.example.com");
        assert_eq!(client.base_url(), "https://api.example.com");
        assert_eq!(client.page_size(), DEFAULT_PAGE_SIZE);
        assert!(client.keys().is_empty());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = StrategyClient::new("https://api.example.com/");
        assert_eq!(client.base_url(), "https://api.example.com");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = StrategyClient::with_client("https://api.example.com", http_client);
        assert_eq!(client.base_url(), "https://api.example.com");
    }

    #[test]
    fn test_request_joins_endpoint_and_sets_token() {
        let mut client = StrategyClient::new("https://api.example.com/");
        client.set_access_token("secret");

        let request = client
            .request(Method::GET, "/v2/user/strategy/status")
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/v2/user/strategy/status"
        );
        assert_eq!(request.headers()[AUTHORIZATION], "secret");
    }

    #[test]
    fn test_request_without_token_has_no_authorization() {
        let client = StrategyClient::new("https://api.example.com");
        let request = client.request(Method::GET, "v2/x").build().unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_clones_share_key_cache() {
        let client = StrategyClient::new("https://api.example.com").with_page_size(0);
        assert_eq!(client.page_size(), 1);

        let clone = client.clone();
        clone.keys().insert(
            "s1",
            stratwatch_core::domain::job::TradingMode::Backtesting,
            "k".into(),
        );
        assert_eq!(client.keys().len(), 1);
    }
}
