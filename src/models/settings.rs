//! Tracking settings value object and validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

/// Positioning accuracy tier requested from the platform locator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyTier {
    /// Coarse, cell-tower level positioning.
    Powersave,
    /// Low-power, city-block accuracy.
    Low,
    /// Balanced power and accuracy.
    Balanced,
    /// High accuracy, GPS preferred.
    High,
    /// Highest accuracy and update cadence, for turn-by-turn use.
    Navigation,
}

/// Settings submitted with a start request.
///
/// Immutable once submitted: a later start request while a session is
/// already running does not replace them. All required fields must be
/// present and well-formed or the request is rejected with
/// [`AppError::InvalidSettings`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct LocationSettings {
    /// Title shown on the persistent tracking notification.
    pub notification_title: String,
    /// Body text shown on the persistent tracking notification.
    pub notification_body: String,
    /// Notification channel the tracking notification is posted on.
    pub notification_channel: String,
    /// Seconds between location updates.
    pub interval_seconds: u32,
    /// Requested positioning accuracy tier.
    pub accuracy: AccuracyTier,
    /// Minimum displacement in meters between reported updates.
    pub distance_filter_m: f64,
    /// Wake-lock duration in seconds; `None` leaves the wake lock disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wake_lock_seconds: Option<u32>,
}

impl LocationSettings {
    /// Check every required field for presence and well-formedness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidSettings` naming the first offending
    /// field.
    pub fn validate(&self) -> Result<()> {
        if self.notification_title.trim().is_empty() {
            return Err(AppError::InvalidSettings(
                "notification_title must not be empty".into(),
            ));
        }
        if self.notification_body.trim().is_empty() {
            return Err(AppError::InvalidSettings(
                "notification_body must not be empty".into(),
            ));
        }
        if self.notification_channel.trim().is_empty() {
            return Err(AppError::InvalidSettings(
                "notification_channel must not be empty".into(),
            ));
        }
        if self.interval_seconds == 0 {
            return Err(AppError::InvalidSettings(
                "interval_seconds must be greater than zero".into(),
            ));
        }
        if !self.distance_filter_m.is_finite() || self.distance_filter_m < 0.0 {
            return Err(AppError::InvalidSettings(
                "distance_filter_m must be finite and non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Persisted snapshot of the last-submitted settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct SettingsSnapshot {
    /// The settings as submitted with the start request.
    pub settings: LocationSettings,
    /// When the snapshot was written.
    pub saved_at: DateTime<Utc>,
}

impl SettingsSnapshot {
    /// Wrap settings with the current timestamp.
    #[must_use]
    pub fn now(settings: LocationSettings) -> Self {
        Self {
            settings,
            saved_at: Utc::now(),
        }
    }
}

/// Partial notification update for a live session.
///
/// Absent fields leave the current notification text unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct NotificationUpdate {
    /// Replacement notification title, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Replacement notification body, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl NotificationUpdate {
    /// Whether the update carries no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }
}
