//! Error types for the Latchkey daemon

use latchkey_core::{CredentialError, LatchError};
use thiserror::Error;

/// Result type alias for daemon operations
pub type Result<T> = std::result::Result<T, DaemonError>;

/// Errors that can occur in the daemon
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Controller fault
    #[error("Controller error: {0}")]
    Core(#[from] LatchError),

    /// Credential store error
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Hardware setup or access failed
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// IPC error
    #[error("IPC error: {0}")]
    Ipc(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for DaemonError {
    fn from(e: serde_json::Error) -> Self {
        DaemonError::Serialization(e.to_string())
    }
}
