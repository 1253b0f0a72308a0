//! Latchkey Core - Lock controller for a single actuated door
//!
//! This crate provides:
//! - The [`LockController`] state machine (unlock, manual lock, status)
//! - Auto-lock scheduling fenced by monotonically increasing generations
//! - Alarm escalation after repeated wrong passwords
//! - The collaborator traits the controller drives (actuator, alerts,
//!   event log, credential store)

pub mod attempts;
pub mod collaborators;
pub mod config;
pub mod controller;
pub mod credentials;
pub mod error;
pub mod events;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use attempts::{AttemptCounter, FailureVerdict};
pub use collaborators::{Actuator, AlertSink, CredentialStore, EventLog};
pub use config::{AlarmPattern, ControllerConfig};
pub use controller::{Collaborators, ControllerSnapshot, LockController};
pub use credentials::{change_password, validate_password};
pub use error::{ActuatorFault, CredentialError, LatchError, Result};
pub use types::{Credential, Generation, LockState, UnlockOutcome};
