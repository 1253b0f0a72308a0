//! Simulated hardware that only logs

use async_trait::async_trait;
use latchkey_core::{Actuator, ActuatorFault, AlarmPattern, AlertSink};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use super::{BEEP_OFF_MS, BEEP_ON_MS};

const POSITION_UNKNOWN: u8 = 0;
const POSITION_LOCKED: u8 = 1;
const POSITION_UNLOCKED: u8 = 2;

/// Actuator that records the last commanded position
pub struct SimulatedActuator {
    lock_angle: f64,
    unlock_angle: f64,
    position: AtomicU8,
}

impl SimulatedActuator {
    /// Simulated servo with the given angles
    pub fn new(lock_angle: f64, unlock_angle: f64) -> Self {
        Self {
            lock_angle,
            unlock_angle,
            position: AtomicU8::new(POSITION_UNKNOWN),
        }
    }

    /// Last commanded position, if any
    pub fn is_locked(&self) -> Option<bool> {
        match self.position.load(Ordering::SeqCst) {
            POSITION_LOCKED => Some(true),
            POSITION_UNLOCKED => Some(false),
            _ => None,
        }
    }
}

#[async_trait]
impl Actuator for SimulatedActuator {
    async fn set_locked(&self, locked: bool) -> Result<(), ActuatorFault> {
        let (angle, position, leds) = if locked {
            (self.lock_angle, POSITION_LOCKED, "red on, green off")
        } else {
            (self.unlock_angle, POSITION_UNLOCKED, "red off, green on")
        };
        self.position.store(position, Ordering::SeqCst);
        info!("[sim] servo -> {} degrees, {}", angle, leds);
        Ok(())
    }
}

/// Alert sink that sleeps through its patterns
pub struct SimulatedAlertSink {
    beeps: u32,
}

impl SimulatedAlertSink {
    /// Simulated buzzer sounding `beeps` beeps per wrong attempt
    pub fn new(beeps: u32) -> Self {
        Self { beeps }
    }
}

#[async_trait]
impl AlertSink for SimulatedAlertSink {
    async fn short_alert(&self) {
        info!("[sim] beep x{}", self.beeps);
        let per_beep = Duration::from_millis(BEEP_ON_MS + BEEP_OFF_MS);
        tokio::time::sleep(per_beep * self.beeps).await;
    }

    async fn run_alarm_pattern(&self, pattern: &AlarmPattern) {
        info!(
            "[sim] alarm: {} pulses of {:?}",
            pattern.pulses, pattern.pulse_duration
        );
        tokio::time::sleep(pattern.total_duration()).await;
        debug!("[sim] alarm pattern finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_actuator_tracks_position() {
        let actuator = SimulatedActuator::new(0.0, 90.0);
        assert_eq!(actuator.is_locked(), None);

        actuator.set_locked(false).await.unwrap();
        assert_eq!(actuator.is_locked(), Some(false));

        actuator.set_locked(true).await.unwrap();
        assert_eq!(actuator.is_locked(), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_alarm_takes_pattern_duration() {
        let sink = SimulatedAlertSink::new(3);
        let pattern = AlarmPattern::default();
        let started = tokio::time::Instant::now();

        sink.run_alarm_pattern(&pattern).await;
        assert!(started.elapsed() >= pattern.total_duration());
    }
}
