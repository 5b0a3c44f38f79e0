// src/error.rs

//! Unified error handling for the tipboard application.

use std::fmt;

use thiserror::Error;

/// Result type alias for tipboard operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Document store operation failed
    #[error("Database error: {0}")]
    Db(#[from] mongodb::error::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller-supplied input is malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Storage or other backend failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Preview fetch/parse failed during tip creation
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Pre-check against the target URL returned a non-success response
    #[error("URL not reachable: {0}")]
    Unreachable(String),

    /// An operation's time bound elapsed
    #[error("Timeout during {operation}")]
    Timeout { operation: String },

    /// Wire protocol violation
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an extraction error.
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction(message.into())
    }

    /// Create an unreachable-URL error.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable(message.into())
    }

    /// Create a timeout error for the named operation.
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}
