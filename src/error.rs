// src/error.rs

//! Unified error handling for the notifier.

use std::fmt;

use thiserror::Error;

/// Result type alias for notifier operations.
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

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Remote API answered with an error
    #[error("{service} returned {status}: {message}")]
    Api {
        service: String,
        status: u16,
        message: String,
    },

    /// Upstream search request failed
    #[error("Fetch error on page {page}: {message}")]
    Fetch { page: usize, message: String },

    /// Sending to a single recipient failed
    #[error("Delivery error for {recipient}: {message}")]
    Delivery { recipient: String, message: String },

    /// Seen-set state could not be written
    #[error("Persist error: {0}")]
    Persist(String),

    /// Another cycle holds the cycle lock
    #[error("A check is already in progress")]
    CycleInProgress,
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a remote API error.
    pub fn api(service: impl Into<String>, status: u16, message: impl fmt::Display) -> Self {
        Self::Api {
            service: service.into(),
            status,
            message: message.to_string(),
        }
    }

    /// Create a fetch error for the given 1-based page number.
    pub fn fetch(page: usize, message: impl fmt::Display) -> Self {
        Self::Fetch {
            page,
            message: message.to_string(),
        }
    }

    /// Create a delivery error for a recipient.
    pub fn delivery(recipient: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Delivery {
            recipient: recipient.into(),
            message: message.to_string(),
        }
    }

    /// Create a persist error.
    pub fn persist(message: impl fmt::Display) -> Self {
        Self::Persist(message.to_string())
    }
}
