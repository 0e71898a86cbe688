//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Persistence failure when interacting with the preference store.
    Store(String),
    /// A start request carried missing or malformed settings.
    InvalidSettings(String),
    /// Location access is not authorized for the tracking session.
    PermissionDenied(String),
    /// The background execution host refused a start or stop command.
    HostUnavailable(String),
    /// Requested entity does not exist. Internal only — never surfaced
    /// to bridge callers for an unregistered callback role.
    NotFound(String),
    /// Bridge request decoding or IPC transport failure.
    Bridge(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Store(msg) => write!(f, "store: {msg}"),
            Self::InvalidSettings(msg) => write!(f, "invalid_settings: {msg}"),
            Self::PermissionDenied(msg) => write!(f, "permission_denied: {msg}"),
            Self::HostUnavailable(msg) => write!(f, "host_unavailable: {msg}"),
            Self::NotFound(msg) => write!(f, "not_found: {msg}"),
            Self::Bridge(msg) => write!(f, "bridge: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
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
        Self::Store(err.to_string())
    }
}
