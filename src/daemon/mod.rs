//! Daemon: the single-process service surface over a Unix socket.

pub mod core;
pub mod ipc;
pub mod run;
pub mod server;

pub use core::Daemon;
pub use ipc::IpcError;
