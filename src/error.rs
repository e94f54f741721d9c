// src/error.rs

//! Unified error handling for the downloader.

use std::fmt;

use thiserror::Error;

/// Result type alias for downloader operations.
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

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Search session misbehaved (no response recorded, closed, ...)
    #[error("Session error: {0}")]
    Session(String),

    /// Embedded JSON payload could not be decoded
    #[error("Malformed {marker} payload: {message}")]
    Payload { marker: String, message: String },

    /// The operator typed the quit sentinel at a CAPTCHA prompt
    #[error("Operator aborted at CAPTCHA prompt")]
    OperatorAborted,

    /// The process received an interrupt signal
    #[error("Interrupted")]
    Interrupted,
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

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a session error.
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }

    /// Create a payload decoding error for the given marker.
    pub fn payload(marker: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Payload {
            marker: marker.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error must abort the whole run instead of being
    /// recorded as a failed result node.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::OperatorAborted | Self::Interrupted)
    }
}
