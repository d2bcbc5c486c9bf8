//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Persistence failure when interacting with the key-value store.
    Db(String),
    /// File-system or I/O operation failure.
    Io(String),
    /// IPC communication failure.
    Ipc(String),
    /// Requested record does not exist.
    NotFound(String),
    /// Caller supplied a value that fails validation.
    InvalidInput(String),
    /// Operation is not permitted in the current capture or reminder state.
    InvalidState(String),
    /// The daily token allowance cannot cover the requested operation.
    QuotaExhausted(String),
    /// Speech engine is absent on this host.
    EngineUnavailable(String),
    /// Speech engine refused access to the microphone.
    PermissionDenied(String),
    /// Classification or generation service call failed.
    ExternalService(String),
    /// A payload could not be decoded into the expected shape.
    MalformedData(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Db(msg) => write!(f, "db: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
            Self::Ipc(msg) => write!(f, "ipc: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            Self::QuotaExhausted(msg) => write!(f, "quota exhausted: {msg}"),
            Self::EngineUnavailable(msg) => write!(f, "engine unavailable: {msg}"),
            Self::PermissionDenied(msg) => write!(f, "permission denied: {msg}"),
            Self::ExternalService(msg) => write!(f, "external service: {msg}"),
            Self::MalformedData(msg) => write!(f, "malformed data: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedData(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::ExternalService(format!("request timed out: {err}"))
        } else {
            Self::ExternalService(err.to_string())
        }
    }
}
