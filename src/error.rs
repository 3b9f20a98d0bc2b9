//! Error types for the hub.
//!
//! Hub operations themselves never fail: slow consumers, closed channels and
//! a shut-down hub all degrade to outcomes or no-ops. Errors only surface
//! while configuring and starting a hub.

use thiserror::Error;

/// Main error type for hub construction and configuration.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl From<serde_json::Error> for HubError {
    fn from(e: serde_json::Error) -> Self {
        HubError::Deserialization(e.to_string())
    }
}

/// Result type for hub construction.
pub type Result<T> = std::result::Result<T, HubError>;
