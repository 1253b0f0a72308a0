//! Latchkey Daemon - System daemon driving a password door lock
//!
//! This crate provides:
//! - File-backed password storage and audit log
//! - Servo, buzzer and LED drivers over Linux sysfs (or a simulation)
//! - The door service wiring those to the lock controller
//! - IPC server for CLI communication

pub mod config;
pub mod credential_store;
pub mod error;
pub mod event_log;
pub mod hardware;
pub mod ipc;
pub mod service;

pub use config::{DaemonConfig, HardwareConfig};
pub use credential_store::FileCredentialStore;
pub use error::{DaemonError, Result};
pub use event_log::FileEventLog;
pub use hardware::Hardware;
pub use ipc::{IpcClient, IpcServer};
pub use service::DoorService;
