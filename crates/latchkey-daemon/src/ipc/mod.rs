//! IPC server for CLI communication
//!
//! Line-delimited JSON over a Unix domain socket. One request per line, one
//! response per line; a connection may carry any number of requests.

mod client;
mod server;
mod types;
mod unix;

// Public API
pub use client::IpcClient;
pub use server::IpcServer;
pub use types::{FaultKind, IpcRequest, IpcResponse};
