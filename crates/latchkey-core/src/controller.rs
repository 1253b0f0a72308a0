//! Lock controller state machine
//!
//! [`LockController`] is the single owner of the lock state, the wrong-attempt
//! counter and the active auto-lock generation. All three live behind one
//! async mutex; every transition (including log writes) happens while it is
//! held, so the audit log is ordered exactly like the transitions.
//!
//! # Auto-lock fencing
//!
//! A successful unlock issues a new [`Generation`] and spawns a deferred task
//! bound to it. When the task wakes it takes the mutex and re-locks only if
//! its generation is still the active one. A later unlock or a manual lock
//! replaces the active generation, which turns every older task into a no-op.
//! No task is ever aborted.
//!
//! # Alarm
//!
//! Reaching the wrong-attempt threshold spawns the alarm pattern in the
//! background. While it runs further unlock attempts are masked
//! ([`UnlockOutcome::AlarmActive`]) and an auto-lock that comes due is left
//! to the alarm. When the pattern completes the door is forced locked and the
//! active generation is cleared, whatever happened in between.
//!
//! Short alerts and the alarm share the alert hardware through a second
//! mutex and run in spawned tasks, so no caller waits on the buzzer.

use std::sync::{Arc, Weak};
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::attempts::{AttemptCounter, FailureVerdict};
use crate::collaborators::{Actuator, AlertSink, CredentialStore, EventLog};
use crate::config::ControllerConfig;
use crate::error::{LatchError, Result};
use crate::events;
use crate::types::{Generation, LockState, UnlockOutcome};

/// The external services a controller drives
#[derive(Clone)]
pub struct Collaborators {
    /// Lock mechanism and indicators
    pub actuator: Arc<dyn Actuator>,
    /// Buzzer and alarm patterns
    pub alerts: Arc<dyn AlertSink>,
    /// Audit trail
    pub log: Arc<dyn EventLog>,
    /// Password holder
    pub credentials: Arc<dyn CredentialStore>,
}

/// Point-in-time view of the controller, taken under its lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSnapshot {
    /// Lock position
    pub state: LockState,
    /// Wrong attempts since the last reset
    pub attempts: u32,
    /// Generation of the pending auto-lock, if any
    pub active_generation: Option<Generation>,
    /// Whether an alarm pattern is running
    pub alarm_active: bool,
}

/// Why a re-lock is being performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelockCause {
    Manual,
    AutoLock,
    Alarm,
}

impl RelockCause {
    fn describe(self) -> &'static str {
        match self {
            RelockCause::Manual => "manual lock",
            RelockCause::AutoLock => "auto-lock",
            RelockCause::Alarm => "alarm lock",
        }
    }
}

struct ControllerState {
    lock_state: LockState,
    attempts: AttemptCounter,
    last_issued: Generation,
    active: Option<Generation>,
    alarm_active: bool,
}

impl ControllerState {
    /// Issue a fresh generation and make it the active one
    fn arm(&mut self) -> Generation {
        self.last_issued = self.last_issued.next();
        self.active = Some(self.last_issued);
        self.last_issued
    }
}

struct Inner {
    config: ControllerConfig,
    collaborators: Collaborators,
    state: Mutex<ControllerState>,
    status_tx: watch::Sender<LockState>,
    /// Serializes everything that drives the alert hardware
    alert_hw: Mutex<()>,
}

/// Serialized owner of the lock state. Cheap to clone.
#[derive(Clone)]
pub struct LockController {
    inner: Arc<Inner>,
}

impl LockController {
    /// Create a controller in the locked state with no pending auto-lock.
    ///
    /// The actuator is not touched; call [`boot`](Self::boot) to assert the
    /// locked position on startup.
    pub fn new(config: ControllerConfig, collaborators: Collaborators) -> Self {
        let (status_tx, _) = watch::channel(LockState::Locked);
        let attempts = AttemptCounter::new(config.max_wrong_attempts);

        Self {
            inner: Arc::new(Inner {
                config,
                collaborators,
                state: Mutex::new(ControllerState {
                    lock_state: LockState::Locked,
                    attempts,
                    last_issued: Generation::ZERO,
                    active: None,
                    alarm_active: false,
                }),
                status_tx,
                alert_hw: Mutex::new(()),
            }),
        }
    }

    /// Controller configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Drive the lock to the locked position at startup
    pub async fn boot(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;

        if let Err(fault) = self.inner.collaborators.actuator.set_locked(true).await {
            error!("Actuator fault during boot: {}", fault);
            self.append(&events::actuator_fault("boot", &fault.0)).await;
            return Err(fault.into());
        }

        state.lock_state = LockState::Locked;
        state.active = None;
        self.publish(&state);
        self.append(events::SYSTEM_BOOT).await;
        info!("Controller booted, door locked");
        Ok(())
    }

    /// Check a password and act on the result.
    ///
    /// Credential lookup, counter update and actuation happen under the
    /// controller lock. Alerts are queued on the alert hardware while the lock
    /// is still held and play in the background; the caller never waits for
    /// a beep or the alarm.
    pub async fn attempt_unlock(&self, supplied: &str) -> Result<UnlockOutcome> {
        let mut state = self.inner.state.lock().await;

        if state.alarm_active {
            debug!("Unlock attempt masked by active alarm");
            return Ok(UnlockOutcome::AlarmActive);
        }

        let credential = match self.inner.collaborators.credentials.read().await {
            Ok(credential) => credential,
            Err(e) => {
                error!("Credential store unavailable: {}", e);
                self.append(&events::credential_fault(&e.to_string())).await;
                return Err(LatchError::CredentialStoreUnavailable(e.to_string()));
            }
        };

        if credential.matches(supplied) {
            self.unlock(&mut state).await?;
            return Ok(UnlockOutcome::Unlocked);
        }

        let max = state.attempts.threshold();
        match state.attempts.record_failure() {
            FailureVerdict::Warn { count } => {
                warn!("Wrong password ({}/{})", count, max);
                self.append(&events::wrong_attempt(count, max)).await;
                self.spawn_short_alert();
                Ok(UnlockOutcome::WrongPassword)
            }
            FailureVerdict::Alarm { count } => {
                warn!("Wrong password ({}/{}), raising alarm", count, max);
                self.append(&events::wrong_attempt(count, max)).await;
                self.append(events::ALARM_TRIGGERED).await;
                state.alarm_active = true;
                self.spawn_alarm();
                Ok(UnlockOutcome::AlarmTriggered)
            }
        }
    }

    /// Lock the door and cancel any pending auto-lock.
    ///
    /// Locking an already locked door re-asserts the actuator but logs
    /// nothing.
    pub async fn manual_lock(&self) -> Result<LockState> {
        let mut state = self.inner.state.lock().await;
        self.relock(&mut state, RelockCause::Manual).await
    }

    /// Last completed lock state. Never waits on the controller lock.
    pub fn status(&self) -> LockState {
        *self.inner.status_tx.borrow()
    }

    /// Watch lock state changes
    pub fn subscribe(&self) -> watch::Receiver<LockState> {
        self.inner.status_tx.subscribe()
    }

    /// Wrong attempts since the last reset
    pub async fn current_attempts(&self) -> u32 {
        self.inner.state.lock().await.attempts.count()
    }

    /// Consistent view of all controller fields
    pub async fn snapshot(&self) -> ControllerSnapshot {
        let state = self.inner.state.lock().await;
        ControllerSnapshot {
            state: state.lock_state,
            attempts: state.attempts.count(),
            active_generation: state.active,
            alarm_active: state.alarm_active,
        }
    }

    async fn unlock(&self, state: &mut MutexGuard<'_, ControllerState>) -> Result<()> {
        if let Err(fault) = self.inner.collaborators.actuator.set_locked(false).await {
            error!("Actuator fault while unlocking: {}", fault);
            self.append(&events::actuator_fault("unlock", &fault.0)).await;

            // The bolt may have moved before the fault was reported
            match self.inner.collaborators.actuator.set_locked(true).await {
                Ok(()) => warn!("Locked position restored after failed unlock"),
                Err(restore) => {
                    error!("Could not restore locked position: {}", restore);
                    self.append(&events::actuator_fault("unlock rollback", &restore.0))
                        .await;
                }
            }
            return Err(fault.into());
        }

        state.attempts.reset();
        state.lock_state = LockState::Unlocked;
        self.publish(state);
        self.append(events::DOOR_UNLOCKED).await;

        let generation = state.arm();
        info!("Door unlocked, auto-lock armed ({})", generation);
        self.schedule_auto_lock(generation);
        Ok(())
    }

    /// Shared re-lock transition for manual lock, auto-lock and alarm end.
    ///
    /// Clears the active generation. On actuator failure the prior state is
    /// kept; automatic causes arm a retry so an open door is not forgotten.
    async fn relock(
        &self,
        state: &mut MutexGuard<'_, ControllerState>,
        cause: RelockCause,
    ) -> Result<LockState> {
        let was_locked = state.lock_state.is_locked();
        let prior_active = state.active.take();

        if let Err(fault) = self.inner.collaborators.actuator.set_locked(true).await {
            error!("Actuator fault during {}: {}", cause.describe(), fault);
            self.append(&events::actuator_fault(cause.describe(), &fault.0))
                .await;

            match cause {
                RelockCause::Manual => state.active = prior_active,
                RelockCause::AutoLock | RelockCause::Alarm if !was_locked => {
                    let retry = state.arm();
                    warn!("Re-lock failed, retrying later ({})", retry);
                    self.schedule_auto_lock(retry);
                }
                RelockCause::AutoLock | RelockCause::Alarm => {}
            }
            return Err(fault.into());
        }

        state.lock_state = LockState::Locked;
        self.publish(state);

        match cause {
            RelockCause::Manual if was_locked => {
                debug!("Door already locked, position re-asserted");
            }
            RelockCause::Manual => {
                self.append(events::DOOR_LOCKED).await;
                info!("Door locked");
            }
            RelockCause::AutoLock => {
                self.append(events::AUTO_LOCK).await;
                info!("Auto-lock activated");
            }
            RelockCause::Alarm => {
                self.append(events::ALARM_ENDED).await;
                info!("Alarm ended, door locked");
            }
        }

        Ok(LockState::Locked)
    }

    fn schedule_auto_lock(&self, generation: Generation) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let delay = self.inner.config.auto_lock_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                LockController { inner }.fire_auto_lock(generation).await;
            }
        });
    }

    async fn fire_auto_lock(&self, generation: Generation) {
        let mut state = self.inner.state.lock().await;

        if state.active != Some(generation) {
            debug!("Stale auto-lock {} ignored", generation);
            return;
        }

        // The alarm re-locks when it ends and clears this generation
        if state.alarm_active {
            debug!("Auto-lock {} left to the running alarm", generation);
            return;
        }

        // Errors are logged inside relock and a retry is armed there
        let _ = self.relock(&mut state, RelockCause::AutoLock).await;
    }

    fn spawn_short_alert(&self) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let _hw = inner.alert_hw.lock().await;
            inner.collaborators.alerts.short_alert().await;
        });
    }

    fn spawn_alarm(&self) {
        let controller = self.clone();
        tokio::spawn(async move {
            controller.run_alarm().await;
        });
    }

    async fn run_alarm(&self) {
        {
            let _hw = self.inner.alert_hw.lock().await;
            info!("Alarm sequence started");
            self.inner
                .collaborators
                .alerts
                .run_alarm_pattern(&self.inner.config.alarm)
                .await;
        }

        let mut state = self.inner.state.lock().await;
        state.alarm_active = false;
        // Errors are logged inside relock and a retry is armed there
        let _ = self.relock(&mut state, RelockCause::Alarm).await;
    }

    fn publish(&self, state: &ControllerState) {
        self.inner.status_tx.send_replace(state.lock_state);
    }

    async fn append(&self, message: &str) {
        self.inner.collaborators.log.append(message).await;
    }
}
