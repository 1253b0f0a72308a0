//! Unix domain socket transport
//!
//! The listener owns its socket file: binding refuses to take over a socket
//! that a live daemon still answers on, and dropping the listener removes
//! the file.

use std::path::{Path, PathBuf};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, warn};

use crate::error::{DaemonError, Result};

/// Socket permissions: the daemon user and its group may drive the lock
const SOCKET_MODE: u32 = 0o660;

/// Listening socket that cleans up after itself
pub struct UnixIpcListener {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl UnixIpcListener {
    /// Bind to `path`, replacing a stale socket from a previous run
    pub async fn bind(path: &Path) -> Result<Self> {
        if path.exists() {
            if UnixStream::connect(path).await.is_ok() {
                return Err(DaemonError::Ipc(format!(
                    "Another daemon is listening on {:?}",
                    path
                )));
            }
            debug!("Removing stale socket {:?}", path);
            std::fs::remove_file(path)?;
        }

        let listener = UnixListener::bind(path)
            .map_err(|e| DaemonError::Ipc(format!("Failed to bind socket: {}", e)))?;

        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(SOCKET_MODE))?;
        }

        Ok(Self {
            listener,
            socket_path: path.to_path_buf(),
        })
    }

    /// Accept an incoming connection
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _) = self
            .listener
            .accept()
            .await
            .map_err(|e| DaemonError::Ipc(format!("Accept failed: {}", e)))?;
        Ok(stream)
    }
}

impl Drop for UnixIpcListener {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove socket {:?}: {}", self.socket_path, e);
            }
        }
    }
}

/// Connect to the daemon listening on `path`
pub async fn connect(path: &Path) -> Result<UnixStream> {
    UnixStream::connect(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound
            || e.kind() == std::io::ErrorKind::ConnectionRefused
        {
            DaemonError::Ipc("Daemon not running".to_string())
        } else {
            DaemonError::Ipc(format!("Failed to connect: {}", e))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_drop_removes_socket() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latchkey.sock");

        let listener = UnixIpcListener::bind(&path).await.unwrap();
        assert!(path.exists());
        drop(listener);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_live_socket_not_taken_over() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latchkey.sock");

        let _first = UnixIpcListener::bind(&path).await.unwrap();
        let second = UnixIpcListener::bind(&path).await;
        assert!(matches!(second, Err(DaemonError::Ipc(_))));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_stale_socket_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latchkey.sock");

        // A socket file nobody listens on
        drop(std::os::unix::net::UnixListener::bind(&path).unwrap());
        assert!(path.exists());

        let _listener = UnixIpcListener::bind(&path).await.unwrap();
        assert!(connect(&path).await.is_ok());
    }

    #[tokio::test]
    async fn test_connect_without_daemon() {
        let dir = tempdir().unwrap();
        let err = connect(&dir.path().join("missing.sock")).await.unwrap_err();
        assert!(err.to_string().contains("not running"));
    }
}
