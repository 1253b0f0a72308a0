//! IPC protocol types
//!
//! Message types for daemon-CLI communication.

use latchkey_core::{LatchError, LockState, UnlockOutcome};
use serde::{Deserialize, Serialize};

/// IPC request types
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IpcRequest {
    /// Check if daemon is running
    Ping,

    /// Try a password
    Unlock { password: String },

    /// Lock immediately
    Lock,

    /// Get lock status
    Status,

    /// Replace the password
    ChangePassword { old: String, new: String },

    /// Read the audit log
    ReadLogs {
        /// Only the newest N entries
        last: Option<usize>,
    },

    /// Empty the audit log
    ClearLogs,
}

impl IpcRequest {
    /// Request name for logging; never includes secrets
    pub fn name(&self) -> &'static str {
        match self {
            IpcRequest::Ping => "Ping",
            IpcRequest::Unlock { .. } => "Unlock",
            IpcRequest::Lock => "Lock",
            IpcRequest::Status => "Status",
            IpcRequest::ChangePassword { .. } => "ChangePassword",
            IpcRequest::ReadLogs { .. } => "ReadLogs",
            IpcRequest::ClearLogs => "ClearLogs",
        }
    }
}

impl std::fmt::Debug for IpcRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IpcRequest::ReadLogs { last } => f.debug_struct("ReadLogs").field("last", last).finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// Hardware or storage fault class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Lock mechanism did not respond; state was rolled back
    Actuator,
    /// Password could not be read; door kept locked
    CredentialStore,
}

/// IPC response types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IpcResponse {
    /// Success with no data
    Ok,

    /// Pong response
    Pong { version: String },

    /// Error response
    Error { message: String },

    /// Controller fault
    Fault { kind: FaultKind, message: String },

    /// Result of an unlock attempt
    UnlockResult { outcome: UnlockOutcome },

    /// Lock state after a lock request
    State { state: LockState },

    /// Status response
    Status {
        state: LockState,
        attempts: u32,
        max_attempts: u32,
        auto_lock_pending: bool,
        alarm_active: bool,
    },

    /// Audit log entries
    Logs { entries: Vec<String> },
}

impl From<LatchError> for IpcResponse {
    fn from(e: LatchError) -> Self {
        let kind = match e {
            LatchError::ActuatorFault(_) => FaultKind::Actuator,
            LatchError::CredentialStoreUnavailable(_) => FaultKind::CredentialStore,
        };
        IpcResponse::Fault {
            kind,
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let json = serde_json::to_string(&IpcRequest::Unlock {
            password: "2025".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"Unlock","password":"2025"}"#);
    }

    #[test]
    fn test_debug_hides_password() {
        let request = IpcRequest::ChangePassword {
            old: "2025".to_string(),
            new: "9999".to_string(),
        };
        let debug = format!("{:?}", request);
        assert_eq!(debug, "ChangePassword");
    }

    #[test]
    fn test_fault_mapping() {
        let response = IpcResponse::from(LatchError::ActuatorFault("jammed".to_string()));
        assert!(matches!(
            response,
            IpcResponse::Fault {
                kind: FaultKind::Actuator,
                ..
            }
        ));

        let json = serde_json::to_string(&IpcResponse::UnlockResult {
            outcome: UnlockOutcome::AlarmTriggered,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"UnlockResult","outcome":"alarm_triggered"}"#);
    }
}
