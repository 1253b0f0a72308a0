//! Controller timing and threshold configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default auto-lock delay after a successful unlock
pub const DEFAULT_AUTO_LOCK_DELAY: Duration = Duration::from_secs(30);

/// Default number of wrong attempts before the alarm
pub const DEFAULT_MAX_WRONG_ATTEMPTS: u32 = 3;

/// Default number of alarm pulses
pub const DEFAULT_ALARM_PULSE_COUNT: u32 = 20;

/// Default length of each half of an alarm pulse
pub const DEFAULT_ALARM_PULSE_DURATION: Duration = Duration::from_millis(150);

/// Shape of the alarm escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmPattern {
    /// Number of on/off pulses
    pub pulses: u32,
    /// Duration of the "on" half and of the "off" half of a pulse
    pub pulse_duration: Duration,
}

impl Default for AlarmPattern {
    fn default() -> Self {
        Self {
            pulses: DEFAULT_ALARM_PULSE_COUNT,
            pulse_duration: DEFAULT_ALARM_PULSE_DURATION,
        }
    }
}

impl AlarmPattern {
    /// Wall-clock length of the whole pattern
    pub fn total_duration(&self) -> Duration {
        self.pulse_duration * 2 * self.pulses
    }
}

/// Lock controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Delay before an unlocked door re-locks itself
    pub auto_lock_delay: Duration,

    /// Wrong attempts that trigger the alarm
    pub max_wrong_attempts: u32,

    /// Alarm escalation pattern
    pub alarm: AlarmPattern,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            auto_lock_delay: DEFAULT_AUTO_LOCK_DELAY,
            max_wrong_attempts: DEFAULT_MAX_WRONG_ATTEMPTS,
            alarm: AlarmPattern::default(),
        }
    }
}

impl ControllerConfig {
    /// Override the auto-lock delay
    pub fn with_auto_lock_delay(mut self, delay: Duration) -> Self {
        self.auto_lock_delay = delay;
        self
    }

    /// Override the alarm threshold. Zero is clamped to one.
    pub fn with_max_wrong_attempts(mut self, attempts: u32) -> Self {
        self.max_wrong_attempts = attempts.max(1);
        self
    }

    /// Override the alarm pattern
    pub fn with_alarm(mut self, alarm: AlarmPattern) -> Self {
        self.alarm = alarm;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.auto_lock_delay.as_secs(), 30);
        assert_eq!(config.max_wrong_attempts, 3);
        assert_eq!(config.alarm.pulses, 20);
        assert_eq!(config.alarm.pulse_duration.as_millis(), 150);
    }

    #[test]
    fn test_alarm_total_duration() {
        // 20 pulses of 150ms on + 150ms off
        assert_eq!(AlarmPattern::default().total_duration(), Duration::from_secs(6));
    }

    #[test]
    fn test_zero_threshold_clamped() {
        let config = ControllerConfig::default().with_max_wrong_attempts(0);
        assert_eq!(config.max_wrong_attempts, 1);
    }
}
