//! Client for communicating with the Latchkey daemon

use std::path::PathBuf;

use latchkey_core::{LockState, UnlockOutcome};
use latchkey_daemon::ipc::{FaultKind, IpcClient, IpcRequest, IpcResponse};
use latchkey_daemon::{DaemonConfig, DaemonError};

/// Client for the Latchkey daemon
pub struct LatchkeyClient {
    inner: IpcClient,
}

/// Error type for client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Lock mechanism fault: {0}")]
    ActuatorFault(String),

    #[error("Password storage unavailable: {0}")]
    CredentialStoreUnavailable(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("Daemon error: {0}")]
    DaemonError(String),
}

impl ClientError {
    fn from_daemon_error(e: DaemonError) -> Self {
        match &e {
            DaemonError::Ipc(msg) if msg.contains("not running") => ClientError::DaemonNotRunning,
            _ => ClientError::DaemonError(e.to_string()),
        }
    }

    /// Map error-ish responses; anything else is unexpected
    fn from_response(response: IpcResponse) -> Self {
        match response {
            IpcResponse::Error { message } => ClientError::RequestFailed(message),
            IpcResponse::Fault {
                kind: FaultKind::Actuator,
                message,
            } => ClientError::ActuatorFault(message),
            IpcResponse::Fault {
                kind: FaultKind::CredentialStore,
                message,
            } => ClientError::CredentialStoreUnavailable(message),
            _ => ClientError::UnexpectedResponse,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Door status as reported by the daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorStatus {
    pub state: LockState,
    pub attempts: u32,
    pub max_attempts: u32,
    pub auto_lock_pending: bool,
    pub alarm_active: bool,
}

impl LatchkeyClient {
    /// Create a new client with the daemon's default socket path
    pub fn new() -> Self {
        Self::with_socket_path(DaemonConfig::default().ipc_socket_path)
    }

    /// Create a new client with a custom socket path
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            inner: IpcClient::new(socket_path),
        }
    }

    async fn request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        self.inner
            .request(request)
            .await
            .map_err(ClientError::from_daemon_error)
    }

    /// Check if the daemon is running
    pub async fn ping(&self) -> Result<String> {
        match self.request(&IpcRequest::Ping).await? {
            IpcResponse::Pong { version } => Ok(version),
            other => Err(ClientError::from_response(other)),
        }
    }

    /// Try a password
    pub async fn unlock(&self, password: &str) -> Result<UnlockOutcome> {
        let request = IpcRequest::Unlock {
            password: password.to_string(),
        };
        match self.request(&request).await? {
            IpcResponse::UnlockResult { outcome } => Ok(outcome),
            other => Err(ClientError::from_response(other)),
        }
    }

    /// Lock now
    pub async fn lock(&self) -> Result<LockState> {
        match self.request(&IpcRequest::Lock).await? {
            IpcResponse::State { state } => Ok(state),
            other => Err(ClientError::from_response(other)),
        }
    }

    /// Get the door status
    pub async fn status(&self) -> Result<DoorStatus> {
        match self.request(&IpcRequest::Status).await? {
            IpcResponse::Status {
                state,
                attempts,
                max_attempts,
                auto_lock_pending,
                alarm_active,
            } => Ok(DoorStatus {
                state,
                attempts,
                max_attempts,
                auto_lock_pending,
                alarm_active,
            }),
            other => Err(ClientError::from_response(other)),
        }
    }

    /// Replace the password
    pub async fn change_password(&self, old: &str, new: &str) -> Result<()> {
        let request = IpcRequest::ChangePassword {
            old: old.to_string(),
            new: new.to_string(),
        };
        match self.request(&request).await? {
            IpcResponse::Ok => Ok(()),
            other => Err(ClientError::from_response(other)),
        }
    }

    /// Read the audit log, optionally only the newest `last` entries
    pub async fn read_logs(&self, last: Option<usize>) -> Result<Vec<String>> {
        match self.request(&IpcRequest::ReadLogs { last }).await? {
            IpcResponse::Logs { entries } => Ok(entries),
            other => Err(ClientError::from_response(other)),
        }
    }

    /// Empty the audit log
    pub async fn clear_logs(&self) -> Result<()> {
        match self.request(&IpcRequest::ClearLogs).await? {
            IpcResponse::Ok => Ok(()),
            other => Err(ClientError::from_response(other)),
        }
    }
}

impl Default for LatchkeyClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_responses_map_to_errors() {
        let err = ClientError::from_response(IpcResponse::Fault {
            kind: FaultKind::Actuator,
            message: "servo".to_string(),
        });
        assert!(matches!(err, ClientError::ActuatorFault(_)));

        let err = ClientError::from_response(IpcResponse::Logs { entries: vec![] });
        assert!(matches!(err, ClientError::UnexpectedResponse));
    }

    #[tokio::test]
    async fn test_missing_daemon_reported() {
        let dir = std::env::temp_dir().join("latchkey-cli-test-no-daemon.sock");
        let client = LatchkeyClient::with_socket_path(dir);
        assert!(matches!(
            client.ping().await,
            Err(ClientError::DaemonNotRunning)
        ));
    }
}
