//! Local IPC layer for `besto-ctl` and other front ends.
//!
//! Provides a named pipe (Windows) or Unix domain socket (Linux/macOS)
//! server that accepts JSON-line commands.

pub mod server;
