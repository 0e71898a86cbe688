//! Location permission gate.

use crate::config::PermissionConfig;

/// External collaborator answering whether location access is currently
/// authorized. Checked synchronously before a session start; never
/// consulted for an already-running session.
pub trait PermissionGate: Send + Sync {
    /// Whether location access is currently authorized.
    fn location_authorized(&self) -> bool;
}

/// Gate backed by the deployment configuration.
#[derive(Debug, Clone)]
pub struct ConfigGate {
    granted: bool,
}

impl ConfigGate {
    /// Build a gate from the permission section of the config.
    #[must_use]
    pub fn new(config: &PermissionConfig) -> Self {
        Self {
            granted: config.location_granted,
        }
    }
}

impl PermissionGate for ConfigGate {
    fn location_authorized(&self) -> bool {
        self.granted
    }
}
