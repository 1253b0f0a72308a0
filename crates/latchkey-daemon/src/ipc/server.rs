//! IPC server implementation

use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use latchkey_core::CredentialError;

use crate::error::Result;
use crate::service::DoorService;

use super::types::{FaultKind, IpcRequest, IpcResponse};
use super::unix::UnixIpcListener;

/// IPC server
pub struct IpcServer {
    /// Socket path
    socket_path: PathBuf,

    /// Door service all requests are dispatched to
    service: Arc<DoorService>,
}

impl IpcServer {
    /// Create a new IPC server
    pub fn new(socket_path: PathBuf, service: Arc<DoorService>) -> Self {
        Self {
            socket_path,
            service,
        }
    }

    /// Serve until the future is dropped; dropping it removes the socket
    pub async fn run(&self) -> Result<()> {
        let listener = UnixIpcListener::bind(&self.socket_path).await?;

        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok(stream) => {
                    let service = Arc::clone(&self.service);

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, service).await {
                            error!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single IPC connection
async fn handle_connection<S>(stream: S, service: Arc<DoorService>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    while reader.read_line(&mut line).await? > 0 {
        let request: IpcRequest = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(e) => {
                let response = IpcResponse::Error {
                    message: format!("Invalid request: {}", e),
                };
                send_response(&mut writer, &response).await?;
                line.clear();
                continue;
            }
        };

        debug!("Received IPC request: {:?}", request);

        let response = handle_request(request, &service).await;

        send_response(&mut writer, &response).await?;
        line.clear();
    }

    Ok(())
}

/// Handle a single request
async fn handle_request(request: IpcRequest, service: &DoorService) -> IpcResponse {
    match request {
        IpcRequest::Ping => IpcResponse::Pong {
            version: env!("CARGO_PKG_VERSION").to_string(),
        },

        IpcRequest::Unlock { password } => match service.unlock(&password).await {
            Ok(outcome) => IpcResponse::UnlockResult { outcome },
            Err(e) => {
                warn!("Unlock failed: {}", e);
                e.into()
            }
        },

        IpcRequest::Lock => match service.lock().await {
            Ok(state) => IpcResponse::State { state },
            Err(e) => {
                warn!("Lock failed: {}", e);
                e.into()
            }
        },

        IpcRequest::Status => {
            let snapshot = service.snapshot().await;
            IpcResponse::Status {
                state: snapshot.state,
                attempts: snapshot.attempts,
                max_attempts: service.controller().config().max_wrong_attempts,
                auto_lock_pending: snapshot.active_generation.is_some(),
                alarm_active: snapshot.alarm_active,
            }
        }

        IpcRequest::ChangePassword { old, new } => {
            match service.change_password(&old, &new).await {
                Ok(()) => IpcResponse::Ok,
                Err(CredentialError::Unavailable(reason)) => IpcResponse::Fault {
                    kind: FaultKind::CredentialStore,
                    message: reason,
                },
                Err(e) => IpcResponse::Error {
                    message: e.to_string(),
                },
            }
        }

        IpcRequest::ReadLogs { last } => match service.read_logs(last).await {
            Ok(entries) => IpcResponse::Logs { entries },
            Err(e) => IpcResponse::Error {
                message: format!("Failed to read logs: {}", e),
            },
        },

        IpcRequest::ClearLogs => match service.clear_logs().await {
            Ok(()) => IpcResponse::Ok,
            Err(e) => IpcResponse::Error {
                message: format!("Failed to clear logs: {}", e),
            },
        },
    }
}

/// Send a response
async fn send_response<W>(writer: &mut W, response: &IpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = serde_json::to_string(response)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DaemonConfig;
    use crate::credential_store::FileCredentialStore;
    use crate::event_log::FileEventLog;
    use latchkey_core::mock::{RecordingActuator, RecordingAlerts};
    use latchkey_core::{LockState, UnlockOutcome};
    use tempfile::{tempdir, TempDir};

    async fn service() -> (TempDir, DoorService) {
        let dir = tempdir().unwrap();
        let config = DaemonConfig::for_directory(dir.path());
        let credentials = Arc::new(FileCredentialStore::new(config.password_file.clone()));
        credentials.ensure_seeded("2025").await.unwrap();

        let service = DoorService::new(
            config.controller_config(),
            Arc::new(RecordingActuator::new()),
            Arc::new(RecordingAlerts::new()),
            credentials,
            Arc::new(FileEventLog::new(config.event_log_path.clone())),
        );
        (dir, service)
    }

    #[tokio::test]
    async fn test_dispatch_unlock_and_status() {
        let (_dir, service) = service().await;

        let response = handle_request(
            IpcRequest::Unlock {
                password: "2025".to_string(),
            },
            &service,
        )
        .await;
        assert!(matches!(
            response,
            IpcResponse::UnlockResult {
                outcome: UnlockOutcome::Unlocked
            }
        ));

        match handle_request(IpcRequest::Status, &service).await {
            IpcResponse::Status {
                state,
                attempts,
                max_attempts,
                auto_lock_pending,
                alarm_active,
            } => {
                assert_eq!(state, LockState::Unlocked);
                assert_eq!(attempts, 0);
                assert_eq!(max_attempts, 3);
                assert!(auto_lock_pending);
                assert!(!alarm_active);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_password_mismatch_is_error() {
        let (_dir, service) = service().await;

        let response = handle_request(
            IpcRequest::ChangePassword {
                old: "0000".to_string(),
                new: "1234".to_string(),
            },
            &service,
        )
        .await;
        assert!(matches!(response, IpcResponse::Error { .. }));
    }

    #[tokio::test]
    async fn test_connection_rejects_garbage_and_continues() {
        let (_dir, service) = service().await;
        let (client, server) = tokio::io::duplex(4096);

        let handle = tokio::spawn(handle_connection(server, Arc::new(service)));

        let (reader, mut writer) = tokio::io::split(client);
        let mut reader = BufReader::new(reader);
        writer.write_all(b"not json\n{\"type\":\"Ping\"}\n").await.unwrap();

        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert!(line.contains("\"type\":\"Error\""));

        line.clear();
        reader.read_line(&mut line).await.unwrap();
        assert!(line.contains("\"type\":\"Pong\""));

        drop(writer);
        drop(reader);
        handle.await.unwrap().unwrap();
    }
}
