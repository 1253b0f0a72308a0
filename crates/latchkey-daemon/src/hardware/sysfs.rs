//! Linux sysfs GPIO and PWM backend
//!
//! The LEDs are common anode and the buzzer is active low, so "on" means
//! writing `0` to the line. [`GpioPin`] hides that behind `set(active)`.

use async_trait::async_trait;
use latchkey_core::{Actuator, ActuatorFault, AlarmPattern, AlertSink};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{servo_duty_percent, BEEP_OFF_MS, BEEP_ON_MS};
use crate::error::{DaemonError, Result};

/// Attempts to configure a freshly exported line before giving up
const EXPORT_RETRIES: u32 = 10;

/// udev needs a moment to apply permissions after export
const EXPORT_RETRY_DELAY: Duration = Duration::from_millis(50);

async fn write_with_retry(path: &Path, value: &str) -> Result<()> {
    let mut last_error = None;
    for _ in 0..EXPORT_RETRIES {
        match tokio::fs::write(path, value).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                last_error = Some(e);
                sleep(EXPORT_RETRY_DELAY).await;
            }
        }
    }
    Err(DaemonError::Hardware(format!(
        "Failed to write {:?}: {}",
        path,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )))
}

/// One output line under `/sys/class/gpio`
#[derive(Debug, Clone)]
pub struct GpioPin {
    value_path: PathBuf,
    active_low: bool,
}

impl GpioPin {
    /// Export `number` (if needed) and configure it as an output
    pub async fn export(root: &Path, number: u32, active_low: bool) -> Result<Self> {
        let pin_dir = root.join(format!("gpio{}", number));

        if !tokio::fs::try_exists(&pin_dir).await? {
            debug!("Exporting gpio{}", number);
            tokio::fs::write(root.join("export"), number.to_string())
                .await
                .map_err(|e| DaemonError::Hardware(format!("Export gpio{}: {}", number, e)))?;
        }

        write_with_retry(&pin_dir.join("direction"), "out").await?;

        Ok(Self::from_value_path(pin_dir.join("value"), active_low))
    }

    /// Use an already configured value file
    pub fn from_value_path(value_path: PathBuf, active_low: bool) -> Self {
        Self {
            value_path,
            active_low,
        }
    }

    /// Turn the attached device on or off
    pub async fn set(&self, active: bool) -> std::io::Result<()> {
        let level = active != self.active_low;
        tokio::fs::write(&self.value_path, if level { "1" } else { "0" }).await
    }
}

/// One channel under `/sys/class/pwm/pwmchipN`
#[derive(Debug, Clone)]
pub struct PwmChannel {
    dir: PathBuf,
    period_ns: u64,
}

impl PwmChannel {
    /// Export `channel` (if needed), set its period and enable it
    pub async fn export(chip: &Path, channel: u32, period_ns: u64) -> Result<Self> {
        let dir = chip.join(format!("pwm{}", channel));

        if !tokio::fs::try_exists(&dir).await? {
            debug!("Exporting {:?} channel {}", chip, channel);
            tokio::fs::write(chip.join("export"), channel.to_string())
                .await
                .map_err(|e| DaemonError::Hardware(format!("Export pwm{}: {}", channel, e)))?;
        }

        write_with_retry(&dir.join("period"), &period_ns.to_string()).await?;
        write_with_retry(&dir.join("duty_cycle"), "0").await?;
        write_with_retry(&dir.join("enable"), "1").await?;

        Ok(Self::from_dir(dir, period_ns))
    }

    /// Use an already configured channel directory
    pub fn from_dir(dir: PathBuf, period_ns: u64) -> Self {
        Self { dir, period_ns }
    }

    /// Set the duty cycle as a percentage of the period
    pub async fn set_duty_percent(&self, percent: f64) -> std::io::Result<()> {
        let duty_ns = (self.period_ns as f64 * percent.clamp(0.0, 100.0) / 100.0).round() as u64;
        tokio::fs::write(self.dir.join("duty_cycle"), duty_ns.to_string()).await
    }
}

/// Hobby servo on a PWM channel
#[derive(Debug, Clone)]
pub struct ServoMotor {
    pwm: PwmChannel,
    settle: Duration,
}

impl ServoMotor {
    /// Servo that is driven for `settle` before its signal is released
    pub fn new(pwm: PwmChannel, settle: Duration) -> Self {
        Self { pwm, settle }
    }

    /// Move to `angle` degrees, then release the signal to stop jitter
    pub async fn move_to(&self, angle: f64) -> std::io::Result<()> {
        self.pwm.set_duty_percent(servo_duty_percent(angle)).await?;
        sleep(self.settle).await;
        self.pwm.set_duty_percent(0.0).await
    }
}

/// Servo bolt with red/green indicators
pub struct SysfsActuator {
    servo: ServoMotor,
    red: GpioPin,
    green: GpioPin,
    lock_angle: f64,
    unlock_angle: f64,
}

impl SysfsActuator {
    /// Assemble an actuator from configured lines
    pub fn new(
        servo: ServoMotor,
        red: GpioPin,
        green: GpioPin,
        lock_angle: f64,
        unlock_angle: f64,
    ) -> Self {
        Self {
            servo,
            red,
            green,
            lock_angle,
            unlock_angle,
        }
    }
}

#[async_trait]
impl Actuator for SysfsActuator {
    async fn set_locked(&self, locked: bool) -> std::result::Result<(), ActuatorFault> {
        let angle = if locked {
            self.lock_angle
        } else {
            self.unlock_angle
        };

        self.servo
            .move_to(angle)
            .await
            .map_err(|e| ActuatorFault::new(format!("servo: {}", e)))?;

        self.red
            .set(locked)
            .await
            .map_err(|e| ActuatorFault::new(format!("red indicator: {}", e)))?;
        self.green
            .set(!locked)
            .await
            .map_err(|e| ActuatorFault::new(format!("green indicator: {}", e)))?;

        debug!("Servo at {} degrees (locked: {})", angle, locked);
        Ok(())
    }
}

/// Buzzer plus the red LED for alarm flashing
pub struct SysfsAlertSink {
    buzzer: GpioPin,
    red: GpioPin,
    beeps: u32,
}

impl SysfsAlertSink {
    /// Alert sink sounding `beeps` beeps per wrong attempt
    pub fn new(buzzer: GpioPin, red: GpioPin, beeps: u32) -> Self {
        Self { buzzer, red, beeps }
    }

    /// Turn the buzzer off
    pub async fn silence(&self) {
        drive(&self.buzzer, false, "buzzer").await;
    }
}

async fn drive(pin: &GpioPin, active: bool, what: &str) {
    if let Err(e) = pin.set(active).await {
        warn!("Failed to drive {}: {}", what, e);
    }
}

#[async_trait]
impl AlertSink for SysfsAlertSink {
    async fn short_alert(&self) {
        for _ in 0..self.beeps {
            drive(&self.buzzer, true, "buzzer").await;
            sleep(Duration::from_millis(BEEP_ON_MS)).await;
            drive(&self.buzzer, false, "buzzer").await;
            sleep(Duration::from_millis(BEEP_OFF_MS)).await;
        }
    }

    async fn run_alarm_pattern(&self, pattern: &AlarmPattern) {
        for _ in 0..pattern.pulses {
            drive(&self.buzzer, true, "buzzer").await;
            drive(&self.red, true, "red indicator").await;
            sleep(pattern.pulse_duration).await;
            drive(&self.buzzer, false, "buzzer").await;
            drive(&self.red, false, "red indicator").await;
            sleep(pattern.pulse_duration).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    /// Fake sysfs tree with pre-exported lines
    fn fake_sysfs() -> TempDir {
        let dir = tempdir().unwrap();
        for n in [23, 24, 25] {
            std::fs::create_dir_all(dir.path().join("gpio").join(format!("gpio{}", n))).unwrap();
        }
        std::fs::create_dir_all(dir.path().join("pwmchip0").join("pwm0")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_gpio_active_low() {
        let dir = fake_sysfs();
        let root = dir.path().join("gpio");

        let pin = GpioPin::export(&root, 23, true).await.unwrap();
        assert_eq!(read(&root.join("gpio23/direction")), "out");

        pin.set(true).await.unwrap();
        assert_eq!(read(&root.join("gpio23/value")), "0");
        pin.set(false).await.unwrap();
        assert_eq!(read(&root.join("gpio23/value")), "1");
    }

    #[tokio::test]
    async fn test_pwm_export_configures_channel() {
        let dir = fake_sysfs();
        let chip = dir.path().join("pwmchip0");

        let pwm = PwmChannel::export(&chip, 0, 20_000_000).await.unwrap();
        assert_eq!(read(&chip.join("pwm0/period")), "20000000");
        assert_eq!(read(&chip.join("pwm0/enable")), "1");

        pwm.set_duty_percent(7.0).await.unwrap();
        assert_eq!(read(&chip.join("pwm0/duty_cycle")), "1400000");
    }

    #[tokio::test]
    async fn test_actuator_sets_indicators() {
        let dir = fake_sysfs();
        let gpio = dir.path().join("gpio");
        let chip = dir.path().join("pwmchip0");

        let red = GpioPin::export(&gpio, 23, true).await.unwrap();
        let green = GpioPin::export(&gpio, 24, true).await.unwrap();
        let pwm = PwmChannel::export(&chip, 0, 20_000_000).await.unwrap();
        let actuator =
            SysfsActuator::new(ServoMotor::new(pwm, Duration::ZERO), red, green, 0.0, 90.0);

        actuator.set_locked(false).await.unwrap();
        assert_eq!(read(&gpio.join("gpio23/value")), "1");
        assert_eq!(read(&gpio.join("gpio24/value")), "0");
        // Signal released after the move
        assert_eq!(read(&chip.join("pwm0/duty_cycle")), "0");

        actuator.set_locked(true).await.unwrap();
        assert_eq!(read(&gpio.join("gpio23/value")), "0");
        assert_eq!(read(&gpio.join("gpio24/value")), "1");
    }

    #[tokio::test]
    async fn test_actuator_reports_fault() {
        let dir = fake_sysfs();
        let gpio = dir.path().join("gpio");

        let red = GpioPin::export(&gpio, 23, true).await.unwrap();
        let green = GpioPin::export(&gpio, 24, true).await.unwrap();
        let missing = PwmChannel::from_dir(dir.path().join("no-such-chip/pwm0"), 20_000_000);
        let actuator =
            SysfsActuator::new(ServoMotor::new(missing, Duration::ZERO), red, green, 0.0, 90.0);

        let fault = actuator.set_locked(true).await.unwrap_err();
        assert!(fault.0.starts_with("servo"));
    }

    #[tokio::test]
    async fn test_alarm_pattern_ends_silent() {
        let dir = fake_sysfs();
        let gpio = dir.path().join("gpio");

        let buzzer = GpioPin::export(&gpio, 25, true).await.unwrap();
        let red = GpioPin::export(&gpio, 23, true).await.unwrap();
        let sink = SysfsAlertSink::new(buzzer, red, 1);

        sink.run_alarm_pattern(&AlarmPattern {
            pulses: 2,
            pulse_duration: Duration::from_millis(1),
        })
        .await;

        assert_eq!(read(&gpio.join("gpio25/value")), "1");
        assert_eq!(read(&gpio.join("gpio23/value")), "1");
    }
}
