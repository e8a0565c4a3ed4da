//! Error types and handling for socialbot

use std::time::Duration;
use thiserror::Error;

/// Result type alias for socialbot operations
pub type Result<T> = std::result::Result<T, Error>;

/// socialbot error types
#[derive(Debug, Error)]
pub enum Error {
    /// Signup, login, logout or token refresh rejected by the API
    #[error("Authentication error: {operation} returned {status}: {message}")]
    Auth {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// Post creation or like rejected by the API
    #[error("API error: {operation} returned {status}: {message}")]
    Api {
        operation: &'static str,
        status: u16,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A session waited at the phase barrier longer than the configured limit
    #[error("Barrier timeout: {arrived}/{parties} sessions arrived after {waited:?}")]
    BarrierTimeout {
        arrived: usize,
        parties: usize,
        waited: Duration,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for rejections reported by the API collaborator, as opposed to
    /// transport or local failures.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Auth { .. } | Error::Api { .. })
    }

    /// HTTP status carried by a rejection
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Auth { status, .. } | Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Serialization(format!("Failed to decode response: {}", err))
        } else {
            Error::Network(format!("HTTP request error: {}", err))
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("Failed to parse config: {}", err))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("Invalid URL: {}", err))
    }
}
