//! Error types for the Odds API client.

use reqwest::StatusCode;
use thiserror::Error;

/// The main error type for oddsapi.
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors (config files, env files, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or invalid configuration, including the API key.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The API answered with a non-success status other than 429.
    #[error("Request to {endpoint} failed with HTTP {status}")]
    Request {
        /// HTTP status returned by the API.
        status: StatusCode,
        /// Endpoint path that was requested.
        endpoint: String,
    },

    /// Response body was not valid JSON.
    #[error("Malformed response body: {0}")]
    ResponseFormat(#[from] serde_json::Error),

    /// Still rate limited after every allowed retry.
    #[error("Rate limited on {endpoint} after {attempts} attempts")]
    RateLimited {
        /// Endpoint path that was requested.
        endpoint: String,
        /// Total number of requests sent, including the first.
        attempts: u32,
    },

    /// Network connectivity errors (DNS, TLS, timeouts, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Alias for Result with our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new request error.
    pub fn request(status: StatusCode, endpoint: impl Into<String>) -> Self {
        Self::Request {
            status,
            endpoint: endpoint.into(),
        }
    }

    /// Create a new network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Check if this error is recoverable (caller can retry later).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network(format!("request timed out: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}
