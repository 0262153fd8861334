//! Polling chat relay
//!
//! Clients register a name, post messages and poll for everything new since
//! their last read position. Old messages are pruned once every client has
//! read past them, and idle connections are evicted on a timer.

pub mod core;
pub mod infrastructure;
pub mod relay;

// Re-export commonly used types
pub use infrastructure::config::{ApiConfig, Config, RelayConfig, StorageConfig};
pub use relay::{ChatRelay, SharedRelay};

use thiserror::Error;

/// Main error type for the relay
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("client '{0}' is already connected")]
    AlreadyConnected(String),

    #[error("client '{0}' is not connected")]
    NotConnected(String),

    #[error("client '{0}' has no history record")]
    UnknownClient(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("Configuration error: {0}")]
    Config(#[from] infrastructure::config::ConfigError),

    #[error("Snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// True for caller mistakes that get the uniform rejection
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            RelayError::AlreadyConnected(_)
                | RelayError::NotConnected(_)
                | RelayError::UnknownClient(_)
                | RelayError::MissingField(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RelayError>;
