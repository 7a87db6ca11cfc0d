//! Error types for the Stratwatch client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the remote strategy API
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Internal server error: {0}")]
    ServerError(String),

    #[error("Gateway timeout: {0}")]
    GatewayTimeout(String),

    /// Any other non-success status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Response body could not be decoded
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Create an error from a non-success status code and response body
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => Self::BadRequest(message),
            401 => Self::Unauthorized(message),
            402 => Self::InsufficientBalance(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            429 => Self::RateLimited(message),
            500 => Self::ServerError(message),
            504 => Self::GatewayTimeout(message),
            _ => Self::ApiError { status, message },
        }
    }

    /// HTTP status code associated with this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            Self::BadRequest(_) => Some(400),
            Self::Unauthorized(_) => Some(401),
            Self::InsufficientBalance(_) => Some(402),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::RateLimited(_) => Some(429),
            Self::ServerError(_) => Some(500),
            Self::GatewayTimeout(_) => Some(504),
            Self::ApiError { status, .. } => Some(*status),
            Self::ParseError(_) | Self::InvalidRequest(_) => None,
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(status) if (400..500).contains(&status))
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(status) if status >= 500)
    }

    /// Gateway/time-out class failures that are expected to clear on their own
    pub fn is_transient(&self) -> bool {
        match self {
            Self::GatewayTimeout(_) | Self::RateLimited(_) => true,
            Self::ApiError { status, .. } => matches!(status, 502 | 503),
            Self::RequestFailed(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// The service answered, but not in a shape the client understands
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::ParseError(_))
    }
}
