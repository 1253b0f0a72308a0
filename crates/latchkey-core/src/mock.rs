//! In-memory collaborators for tests and simulations
//!
//! Each mock records what the controller asked of it so tests can assert on
//! actuator commands, alerts and log entries. Alarm patterns sleep on the
//! tokio clock, which makes them compatible with paused-time tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::collaborators::{Actuator, AlertSink, CredentialStore, EventLog};
use crate::config::{AlarmPattern, ControllerConfig};
use crate::controller::{Collaborators, LockController};
use crate::error::{ActuatorFault, CredentialError};
use crate::types::Credential;

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Records every `set_locked` command; can be told to fail
#[derive(Debug, Default)]
pub struct RecordingActuator {
    commands: Mutex<Vec<bool>>,
    failing: AtomicBool,
    unlock_jams: AtomicBool,
}

impl RecordingActuator {
    /// New actuator that succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands issued so far (`true` = lock)
    pub fn commands(&self) -> Vec<bool> {
        guard(&self.commands).clone()
    }

    /// Number of lock commands issued
    pub fn lock_commands(&self) -> usize {
        guard(&self.commands).iter().filter(|&&locked| locked).count()
    }

    /// Number of unlock commands issued
    pub fn unlock_commands(&self) -> usize {
        guard(&self.commands).iter().filter(|&&locked| !locked).count()
    }

    /// Make subsequent commands fail (failed commands are not recorded)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make unlock commands move the bolt and then report a fault
    pub fn set_unlock_jams(&self, jams: bool) {
        self.unlock_jams.store(jams, Ordering::SeqCst);
    }

    /// Forget recorded commands
    pub fn clear(&self) {
        guard(&self.commands).clear();
    }
}

#[async_trait]
impl Actuator for RecordingActuator {
    async fn set_locked(&self, locked: bool) -> Result<(), ActuatorFault> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ActuatorFault::new("servo did not respond"));
        }
        guard(&self.commands).push(locked);
        if !locked && self.unlock_jams.load(Ordering::SeqCst) {
            return Err(ActuatorFault::new("indicator write failed after move"));
        }
        Ok(())
    }
}

/// Counts alerts and detects overlapping hardware use
#[derive(Debug, Default)]
pub struct RecordingAlerts {
    short_alerts: AtomicUsize,
    alarms_started: AtomicUsize,
    alarms_finished: AtomicUsize,
    busy: AtomicBool,
    overlapped: AtomicBool,
}

impl RecordingAlerts {
    /// New recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Short alerts sounded
    pub fn short_alerts(&self) -> usize {
        self.short_alerts.load(Ordering::SeqCst)
    }

    /// Alarm patterns started
    pub fn alarms_started(&self) -> usize {
        self.alarms_started.load(Ordering::SeqCst)
    }

    /// Alarm patterns run to completion
    pub fn alarms_finished(&self) -> usize {
        self.alarms_finished.load(Ordering::SeqCst)
    }

    /// Whether two patterns ever drove the hardware at the same time
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
    }

    fn leave(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl AlertSink for RecordingAlerts {
    async fn short_alert(&self) {
        self.enter();
        self.short_alerts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(900)).await;
        self.leave();
    }

    async fn run_alarm_pattern(&self, pattern: &AlarmPattern) {
        self.enter();
        self.alarms_started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(pattern.total_duration()).await;
        self.alarms_finished.fetch_add(1, Ordering::SeqCst);
        self.leave();
    }
}

/// Event log kept in a vector
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    entries: Mutex<Vec<String>>,
}

impl MemoryEventLog {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in append order
    pub fn entries(&self) -> Vec<String> {
        guard(&self.entries).clone()
    }

    /// Number of entries equal to `message`
    pub fn count(&self, message: &str) -> usize {
        guard(&self.entries).iter().filter(|e| e.as_str() == message).count()
    }

    /// Drop all entries
    pub fn clear(&self) {
        guard(&self.entries).clear();
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn append(&self, message: &str) {
        guard(&self.entries).push(message.to_string());
    }
}

/// Password held in memory; can be made unavailable
#[derive(Debug)]
pub struct MemoryCredentialStore {
    password: Mutex<String>,
    unavailable: AtomicBool,
    reads: AtomicUsize,
}

impl MemoryCredentialStore {
    /// Store holding `password`
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: Mutex::new(password.into()),
            unavailable: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
        }
    }

    /// Simulate storage failure
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of reads served or refused
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Current password, bypassing the trait
    pub fn current(&self) -> String {
        guard(&self.password).clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn read(&self) -> Result<Credential, CredentialError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CredentialError::Unavailable("backing store offline".to_string()));
        }
        Ok(Credential::new(guard(&self.password).clone()))
    }

    async fn replace(&self, old: &str, new: &str) -> Result<(), CredentialError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CredentialError::Unavailable("backing store offline".to_string()));
        }
        let mut password = guard(&self.password);
        if *password != old {
            return Err(CredentialError::Mismatch);
        }
        *password = new.to_string();
        Ok(())
    }
}

/// A controller wired to fresh mocks
pub struct MockRig {
    /// Controller under test
    pub controller: LockController,
    /// Actuator recorder
    pub actuator: Arc<RecordingActuator>,
    /// Alert recorder
    pub alerts: Arc<RecordingAlerts>,
    /// Event log
    pub log: Arc<MemoryEventLog>,
    /// Credential store
    pub credentials: Arc<MemoryCredentialStore>,
}

impl MockRig {
    /// Build a rig with the given config and password
    pub fn new(config: ControllerConfig, password: &str) -> Self {
        let actuator = Arc::new(RecordingActuator::new());
        let alerts = Arc::new(RecordingAlerts::new());
        let log = Arc::new(MemoryEventLog::new());
        let credentials = Arc::new(MemoryCredentialStore::new(password));

        let controller = LockController::new(
            config,
            Collaborators {
                actuator: actuator.clone(),
                alerts: alerts.clone(),
                log: log.clone(),
                credentials: credentials.clone(),
            },
        );

        Self {
            controller,
            actuator,
            alerts,
            log,
            credentials,
        }
    }

    /// Rig with default configuration and password `2025`
    pub fn with_defaults() -> Self {
        Self::new(ControllerConfig::default(), "2025")
    }
}
