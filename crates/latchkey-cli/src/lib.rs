//! Latchkey CLI - talk to the door lock daemon
//!
//! Thin client over the daemon's IPC socket.

pub mod client;

pub use client::{ClientError, DoorStatus, LatchkeyClient};
