//! Callback registry over the durable preference store.
//!
//! Maps logical callback roles to opaque handles so that a background
//! execution context recreated after process death can rediscover what
//! to invoke. Registration always overwrites; an unregistered role is
//! `Ok(None)`, never an error — "feature not configured" is a normal
//! state, not a failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::callback::{CallbackBinding, CallbackRole};
use crate::models::settings::{LocationSettings, SettingsSnapshot};
use crate::persistence::preference_repo::PreferenceRepo;
use crate::Result;

/// Preference domain all registry keys live under.
const DOMAIN: &str = "locator";

/// Persisted form of a binding: the binding plus registration time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
struct StoredBinding {
    binding: CallbackBinding,
    registered_at: DateTime<Utc>,
}

/// Registry of durable (role → handle) bindings and the settings snapshot.
#[derive(Clone)]
pub struct CallbackRegistry {
    repo: PreferenceRepo,
}

impl CallbackRegistry {
    /// Create a registry over the given preference repository.
    #[must_use]
    pub fn new(repo: PreferenceRepo) -> Self {
        Self { repo }
    }

    fn role_key(role: CallbackRole) -> String {
        format!("{DOMAIN}.callback.{}", role.key_fragment())
    }

    fn settings_key() -> String {
        format!("{DOMAIN}.settings")
    }

    /// Persist a binding, overwriting any prior binding for its role.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the write fails.
    pub async fn register(&self, binding: &CallbackBinding) -> Result<()> {
        let stored = StoredBinding {
            binding: binding.clone(),
            registered_at: Utc::now(),
        };
        self.repo
            .set_json(&Self::role_key(binding.role), &stored)
            .await
    }

    /// Look up the binding for a role.
    ///
    /// A returned handle may have been minted by an execution context
    /// that no longer exists; the caller is responsible for treating a
    /// stale issuer as a runtime error of the execution context, not of
    /// the registry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the read fails.
    pub async fn lookup(&self, role: CallbackRole) -> Result<Option<CallbackBinding>> {
        let stored: Option<StoredBinding> = self.repo.get_json(&Self::role_key(role)).await?;
        Ok(stored.map(|s| s.binding))
    }

    /// Whether a binding is registered for the role.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the read fails.
    pub async fn has(&self, role: CallbackRole) -> Result<bool> {
        self.repo.has(&Self::role_key(role)).await
    }

    /// Persist the last-submitted settings snapshot.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the write fails.
    pub async fn save_settings(&self, settings: &LocationSettings) -> Result<()> {
        self.repo
            .set_json(&Self::settings_key(), &SettingsSnapshot::now(settings.clone()))
            .await
    }

    /// Read back the last-submitted settings snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the read fails.
    pub async fn settings_snapshot(&self) -> Result<Option<SettingsSnapshot>> {
        self.repo.get_json(&Self::settings_key()).await
    }
}
