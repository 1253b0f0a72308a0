//! The door service: controller plus its file-backed collaborators
//!
//! Everything the IPC layer can ask for goes through [`DoorService`].

use latchkey_core::{
    change_password, Actuator, AlertSink, Collaborators, ControllerConfig, ControllerSnapshot,
    CredentialError, LockController, LockState, UnlockOutcome,
};
use std::sync::Arc;
use tracing::info;

use crate::config::DaemonConfig;
use crate::credential_store::FileCredentialStore;
use crate::error::Result;
use crate::event_log::FileEventLog;
use crate::hardware::Hardware;

/// Lock controller wired to its stores
pub struct DoorService {
    controller: LockController,
    credentials: Arc<FileCredentialStore>,
    event_log: Arc<FileEventLog>,
}

impl DoorService {
    /// Build the service from configuration, seed the password and boot
    pub async fn start(config: &DaemonConfig) -> Result<Self> {
        let credentials = Arc::new(FileCredentialStore::new(config.password_file.clone()));
        credentials.ensure_seeded(&config.default_password).await?;

        let event_log = Arc::new(FileEventLog::new(config.event_log_path.clone()));
        let hardware = Hardware::from_config(config).await?;

        let service = Self::new(
            config.controller_config(),
            hardware.actuator,
            hardware.alerts,
            credentials,
            event_log,
        );
        service.controller.boot().await?;
        Ok(service)
    }

    /// Assemble a service from explicit parts (no boot)
    pub fn new(
        config: ControllerConfig,
        actuator: Arc<dyn Actuator>,
        alerts: Arc<dyn AlertSink>,
        credentials: Arc<FileCredentialStore>,
        event_log: Arc<FileEventLog>,
    ) -> Self {
        let controller = LockController::new(
            config,
            Collaborators {
                actuator,
                alerts,
                log: event_log.clone(),
                credentials: credentials.clone(),
            },
        );

        Self {
            controller,
            credentials,
            event_log,
        }
    }

    /// The underlying controller
    pub fn controller(&self) -> &LockController {
        &self.controller
    }

    /// Try a password
    pub async fn unlock(&self, password: &str) -> latchkey_core::Result<UnlockOutcome> {
        self.controller.attempt_unlock(password).await
    }

    /// Lock now
    pub async fn lock(&self) -> latchkey_core::Result<LockState> {
        self.controller.manual_lock().await
    }

    /// Last completed lock state
    pub fn status(&self) -> LockState {
        self.controller.status()
    }

    /// Full controller snapshot
    pub async fn snapshot(&self) -> ControllerSnapshot {
        self.controller.snapshot().await
    }

    /// Change the password
    pub async fn change_password(
        &self,
        old: &str,
        new: &str,
    ) -> std::result::Result<(), CredentialError> {
        change_password(self.credentials.as_ref(), self.event_log.as_ref(), old, new).await
    }

    /// Audit log entries, optionally only the newest `last`
    pub async fn read_logs(&self, last: Option<usize>) -> Result<Vec<String>> {
        match last {
            Some(n) => self.event_log.tail(n).await,
            None => self.event_log.entries().await,
        }
    }

    /// Empty the audit log
    pub async fn clear_logs(&self) -> Result<()> {
        self.event_log.clear().await?;
        info!("Event log cleared");
        Ok(())
    }

    /// Wait for any in-flight transition to finish.
    ///
    /// Pending auto-locks are not waited for.
    pub async fn shutdown(&self) {
        let snapshot = self.controller.snapshot().await;
        info!("Door service stopped with door {}", snapshot.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latchkey_core::events;
    use latchkey_core::mock::{RecordingActuator, RecordingAlerts};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_start_seeds_and_boots() {
        let dir = tempdir().unwrap();
        let config = DaemonConfig::for_directory(dir.path());

        let service = DoorService::start(&config).await.unwrap();
        assert_eq!(service.status(), LockState::Locked);
        assert_eq!(
            std::fs::read_to_string(&config.password_file).unwrap(),
            "2025"
        );

        let logs = service.read_logs(None).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].ends_with(events::SYSTEM_BOOT));
    }

    #[tokio::test]
    async fn test_password_change_affects_next_unlock() {
        let dir = tempdir().unwrap();
        let config = DaemonConfig::for_directory(dir.path());
        let credentials = Arc::new(FileCredentialStore::new(config.password_file.clone()));
        credentials.ensure_seeded("2025").await.unwrap();
        let actuator = Arc::new(RecordingActuator::new());

        let service = DoorService::new(
            config.controller_config(),
            actuator.clone(),
            Arc::new(RecordingAlerts::new()),
            credentials,
            Arc::new(FileEventLog::new(config.event_log_path.clone())),
        );

        service.change_password("2025", "8080").await.unwrap();
        assert_eq!(service.unlock("8080").await.unwrap(), UnlockOutcome::Unlocked);
        assert_eq!(actuator.commands(), vec![false]);

        let logs = service.read_logs(Some(2)).await.unwrap();
        assert!(logs[0].ends_with(events::PASSWORD_CHANGED));
        assert!(logs[1].ends_with(events::DOOR_UNLOCKED));
    }
}
