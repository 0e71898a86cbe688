//! Global configuration parsing and validation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{AppError, Result};

/// Background execution host process configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct HostConfig {
    /// Locator host binary invoked for each tracking session.
    pub command: String,
    /// Default arguments for the host binary.
    #[serde(default)]
    pub args: Vec<String>,
    /// Grace period before a start acknowledgement falls back to
    /// optimistic success (liveness fallback, not a readiness proof).
    #[serde(default = "default_start_grace_seconds")]
    pub start_grace_seconds: u64,
    /// Grace wait for the host process to exit before force-kill.
    #[serde(default = "default_stop_grace_seconds")]
    pub stop_grace_seconds: u64,
}

fn default_start_grace_seconds() -> u64 {
    1
}

fn default_stop_grace_seconds() -> u64 {
    5
}

/// Location permission gate configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PermissionConfig {
    /// Whether location access is granted for this deployment.
    #[serde(default = "default_true")]
    pub location_granted: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self {
            location_granted: true,
        }
    }
}

fn default_ipc_name() -> String {
    "geotrackd".into()
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Directory holding the preference store and runtime state.
    pub state_dir: PathBuf,
    /// Named pipe / Unix socket identifier for the caller bridge.
    #[serde(default = "default_ipc_name")]
    pub ipc_name: String,
    /// Background execution host settings.
    pub host: HostConfig,
    /// Location permission gate settings.
    #[serde(default)]
    pub permission: PermissionConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Derived path for the `SQLite` preference store.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.state_dir.join("geotrackd.db")
    }

    fn validate(&self) -> Result<()> {
        if self.host.command.trim().is_empty() {
            return Err(AppError::Config("host.command must not be empty".into()));
        }
        if self.ipc_name.trim().is_empty() {
            return Err(AppError::Config("ipc_name must not be empty".into()));
        }
        if self.host.stop_grace_seconds == 0 {
            return Err(AppError::Config(
                "host.stop_grace_seconds must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
