//! Interfaces the controller drives
//!
//! The controller owns no hardware and no files. Everything with side
//! effects is reached through these traits so that backends (sysfs GPIO, a
//! simulator, in-memory recorders) can be swapped freely.

use async_trait::async_trait;

use crate::config::AlarmPattern;
use crate::error::{ActuatorFault, CredentialError};
use crate::types::Credential;

/// Moves the lock mechanism and sets the status indicators
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Drive the bolt to the locked (`true`) or unlocked (`false`) position
    /// and set the indicators to match.
    ///
    /// Returns only once the command has been issued. Repeating a position
    /// must be harmless.
    async fn set_locked(&self, locked: bool) -> std::result::Result<(), ActuatorFault>;
}

/// Audible and visual alerts
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Short "wrong attempt" pattern
    async fn short_alert(&self);

    /// Full alarm escalation; may run for several seconds
    async fn run_alarm_pattern(&self, pattern: &AlarmPattern);
}

/// Append-only audit trail.
///
/// Failures are the implementation's concern and are never reported back.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Record one entry
    async fn append(&self, message: &str);
}

/// Holder of the current password
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the current password
    async fn read(&self) -> std::result::Result<Credential, CredentialError>;

    /// Replace the password if `old` matches the stored value
    async fn replace(&self, old: &str, new: &str) -> std::result::Result<(), CredentialError>;
}
