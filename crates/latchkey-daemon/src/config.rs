//! Daemon configuration

use latchkey_core::{AlarmPattern, ControllerConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{DaemonError, Result};

/// Password written to a fresh installation
pub const DEFAULT_PASSWORD: &str = "2025";

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Unix socket path for IPC
    pub ipc_socket_path: PathBuf,

    /// File holding the current password
    pub password_file: PathBuf,

    /// Append-only audit log
    pub event_log_path: PathBuf,

    /// Password seeded when the password file does not exist
    pub default_password: String,

    /// Seconds before an unlocked door re-locks
    pub auto_lock_delay_secs: u64,

    /// Wrong attempts before the alarm
    pub max_wrong_attempts: u32,

    /// Number of alarm pulses
    pub alarm_pulse_count: u32,

    /// Half-period of an alarm pulse (milliseconds)
    pub alarm_pulse_duration_ms: u64,

    /// Beeps sounded for a wrong attempt
    pub wrong_attempt_beeps: u32,

    /// Pin and servo wiring
    pub hardware: HardwareConfig,

    /// Use simulated hardware instead of sysfs
    pub dev_mode: bool,
}

/// Pin and servo wiring (Linux sysfs numbering)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// Root of the sysfs GPIO class
    pub gpio_root: PathBuf,

    /// PWM chip driving the servo
    pub pwm_chip: PathBuf,

    /// Channel on the PWM chip
    pub pwm_channel: u32,

    /// Buzzer GPIO (active low)
    pub buzzer_gpio: u32,

    /// Red indicator GPIO (common anode, active low)
    pub led_red_gpio: u32,

    /// Green indicator GPIO (common anode, active low)
    pub led_green_gpio: u32,

    /// Servo angle for the locked position (degrees)
    pub lock_angle: f64,

    /// Servo angle for the unlocked position (degrees)
    pub unlock_angle: f64,

    /// Time the servo is driven before the signal is released (milliseconds)
    pub servo_settle_ms: u64,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            gpio_root: PathBuf::from("/sys/class/gpio"),
            pwm_chip: PathBuf::from("/sys/class/pwm/pwmchip0"),
            pwm_channel: 0,
            buzzer_gpio: 25,
            led_red_gpio: 23,
            led_green_gpio: 24,
            lock_angle: 0.0,
            unlock_angle: 90.0,
            servo_settle_ms: 400,
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        let data_dir = Self::default_data_dir();
        Self {
            ipc_socket_path: Self::default_ipc_path(),
            password_file: data_dir.join("password.txt"),
            event_log_path: data_dir.join("logs").join("events.log"),
            default_password: DEFAULT_PASSWORD.to_string(),
            auto_lock_delay_secs: 30,
            max_wrong_attempts: 3,
            alarm_pulse_count: 20,
            alarm_pulse_duration_ms: 150,
            wrong_attempt_beeps: 3,
            hardware: HardwareConfig::default(),
            dev_mode: false,
        }
    }
}

impl DaemonConfig {
    /// Default IPC path, under XDG_RUNTIME_DIR when available
    fn default_ipc_path() -> PathBuf {
        std::env::var_os("XDG_RUNTIME_DIR")
            .map(|dir| PathBuf::from(dir).join("latchkey.sock"))
            .unwrap_or_else(|| PathBuf::from("/tmp/latchkey.sock"))
    }

    fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("/var/lib"))
            .join("latchkey")
    }

    /// Configuration rooted in `dir`, with simulated hardware.
    ///
    /// Used by tests and local development.
    pub fn for_directory(dir: &std::path::Path) -> Self {
        Self {
            ipc_socket_path: dir.join("latchkey.sock"),
            password_file: dir.join("password.txt"),
            event_log_path: dir.join("logs").join("events.log"),
            dev_mode: true,
            ..Self::default()
        }
    }

    /// Load configuration from file
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the controller cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_wrong_attempts == 0 {
            return Err(DaemonError::Config(
                "max_wrong_attempts must be at least 1".to_string(),
            ));
        }
        if self.auto_lock_delay_secs == 0 {
            return Err(DaemonError::Config(
                "auto_lock_delay_secs must be at least 1".to_string(),
            ));
        }
        for (name, angle) in [
            ("lock_angle", self.hardware.lock_angle),
            ("unlock_angle", self.hardware.unlock_angle),
        ] {
            if !(0.0..=180.0).contains(&angle) {
                return Err(DaemonError::Config(format!(
                    "{} must be between 0 and 180 degrees, got {}",
                    name, angle
                )));
            }
        }
        latchkey_core::validate_password(&self.default_password)
            .map_err(|e| DaemonError::Config(format!("default_password: {}", e)))?;
        Ok(())
    }

    /// Controller settings derived from this configuration
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig::default()
            .with_auto_lock_delay(Duration::from_secs(self.auto_lock_delay_secs))
            .with_max_wrong_attempts(self.max_wrong_attempts)
            .with_alarm(AlarmPattern {
                pulses: self.alarm_pulse_count,
                pulse_duration: Duration::from_millis(self.alarm_pulse_duration_ms),
            })
    }

    /// Create directories if they don't exist
    pub fn ensure_directories(&self) -> Result<()> {
        for path in [
            &self.password_file,
            &self.event_log_path,
            &self.ipc_socket_path,
        ] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Helper module for dirs crate functionality
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share"))
            })
    }
}
