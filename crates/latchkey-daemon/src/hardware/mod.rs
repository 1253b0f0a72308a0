//! Hardware backends for the lock and alerts
//!
//! Two backends implement the controller's [`Actuator`] and [`AlertSink`]:
//! - [`sysfs`]: servo on a PWM channel, buzzer and common-anode LEDs on
//!   GPIO lines, all through the Linux sysfs interface
//! - [`simulated`]: logs what the hardware would do; used in dev mode and
//!   on machines without the wiring

pub mod simulated;
pub mod sysfs;

use latchkey_core::{Actuator, AlertSink};
use std::sync::Arc;
use tracing::info;

use crate::config::DaemonConfig;
use crate::error::Result;

pub use simulated::{SimulatedActuator, SimulatedAlertSink};
pub use sysfs::{GpioPin, PwmChannel, ServoMotor, SysfsActuator, SysfsAlertSink};

/// Servo PWM period (50 Hz)
pub const SERVO_PERIOD_NS: u64 = 20_000_000;

/// Wrong-attempt beep: on time
pub const BEEP_ON_MS: u64 = 200;

/// Wrong-attempt beep: gap after each beep
pub const BEEP_OFF_MS: u64 = 100;

/// Duty cycle, in percent of the period, that moves a hobby servo to `angle`
pub fn servo_duty_percent(angle: f64) -> f64 {
    angle / 18.0 + 2.0
}

/// Lock and alert backends selected by the configuration
pub struct Hardware {
    /// Lock mechanism and indicators
    pub actuator: Arc<dyn Actuator>,
    /// Buzzer
    pub alerts: Arc<dyn AlertSink>,
}

impl Hardware {
    /// Set up the configured backend and put outputs in their idle state
    pub async fn from_config(config: &DaemonConfig) -> Result<Self> {
        if config.dev_mode {
            info!("Dev mode: using simulated hardware");
            return Ok(Self::simulated(config));
        }

        let hw = &config.hardware;
        let red = GpioPin::export(&hw.gpio_root, hw.led_red_gpio, true).await?;
        let green = GpioPin::export(&hw.gpio_root, hw.led_green_gpio, true).await?;
        let buzzer = GpioPin::export(&hw.gpio_root, hw.buzzer_gpio, true).await?;
        let pwm = PwmChannel::export(&hw.pwm_chip, hw.pwm_channel, SERVO_PERIOD_NS).await?;

        let servo = ServoMotor::new(pwm, std::time::Duration::from_millis(hw.servo_settle_ms));
        let actuator = SysfsActuator::new(servo, red.clone(), green, hw.lock_angle, hw.unlock_angle);
        let alerts = SysfsAlertSink::new(buzzer, red, config.wrong_attempt_beeps);
        alerts.silence().await;

        info!(
            "Sysfs hardware ready (servo {:?}/pwm{}, buzzer gpio{}, leds gpio{}/gpio{})",
            hw.pwm_chip, hw.pwm_channel, hw.buzzer_gpio, hw.led_red_gpio, hw.led_green_gpio
        );

        Ok(Self {
            actuator: Arc::new(actuator),
            alerts: Arc::new(alerts),
        })
    }

    /// Simulated backend honoring the configured angles and beep count
    pub fn simulated(config: &DaemonConfig) -> Self {
        Self {
            actuator: Arc::new(SimulatedActuator::new(
                config.hardware.lock_angle,
                config.hardware.unlock_angle,
            )),
            alerts: Arc::new(SimulatedAlertSink::new(config.wrong_attempt_beeps)),
        }
    }
}
