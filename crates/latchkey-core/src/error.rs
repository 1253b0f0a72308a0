//! Error types for the lock controller

use thiserror::Error;

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, LatchError>;

/// Faults surfaced by the controller.
///
/// Wrong passwords and alarms are ordinary outcomes (see
/// [`UnlockOutcome`](crate::UnlockOutcome)), not errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LatchError {
    /// The actuator did not confirm the requested position
    #[error("Actuator fault: {0}")]
    ActuatorFault(String),

    /// The credential could not be read; the door stays locked
    #[error("Credential store unavailable: {0}")]
    CredentialStoreUnavailable(String),
}

/// Failure reported by an [`Actuator`](crate::Actuator) implementation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ActuatorFault(pub String);

impl ActuatorFault {
    /// Create a fault from any displayable cause
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl From<ActuatorFault> for LatchError {
    fn from(e: ActuatorFault) -> Self {
        LatchError::ActuatorFault(e.0)
    }
}

/// Errors raised by a [`CredentialStore`](crate::CredentialStore)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Backing storage could not be read or written
    #[error("Credential storage unavailable: {0}")]
    Unavailable(String),

    /// The supplied current password did not match
    #[error("Current password incorrect")]
    Mismatch,

    /// The replacement password was rejected
    #[error("Invalid password: {0}")]
    Invalid(String),
}

impl From<CredentialError> for LatchError {
    fn from(e: CredentialError) -> Self {
        LatchError::CredentialStoreUnavailable(e.to_string())
    }
}
