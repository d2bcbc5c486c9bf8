//! Capture-and-scheduling core of the Besto productivity assistant.

#![forbid(unsafe_code)]

pub mod assistant;
pub mod capture;
pub mod clock;
pub mod config;
pub mod digest;
pub mod errors;
pub mod ipc;
pub mod models;
pub mod persistence;
pub mod quota;
pub mod reminders;
pub mod speech;
pub mod state;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
pub use state::{AppState, Collaborators};
