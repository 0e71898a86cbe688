//! Event forwarder for notification interaction.
//!
//! Relays the single out-of-band event kind — user interaction with the
//! tracking notification — into the background execution context. The
//! trigger source has no one to report errors to, so an unregistered
//! handler is a silent no-op by design.

use tracing::{info, warn};

use crate::host::HostHandle;
use crate::models::callback::CallbackRole;
use crate::registry::CallbackRegistry;
use crate::Result;

/// Forwards notification-interaction events to the registered callback.
#[derive(Clone)]
pub struct EventForwarder {
    registry: CallbackRegistry,
    host: HostHandle,
}

impl EventForwarder {
    /// Build a forwarder over the registry and host command channel.
    #[must_use]
    pub fn new(registry: CallbackRegistry, host: HostHandle) -> Self {
        Self { registry, host }
    }

    /// Forward a notification-interaction event.
    ///
    /// Returns whether delivery was attempted: `false` when no
    /// notification-click callback is registered (the caller may simply
    /// not have registered interest). Delivery itself is fire-and-forget
    /// and best-effort; no acknowledgement is awaited.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the registry lookup fails.
    pub async fn forward_notification_interaction(
        &self,
        payload: serde_json::Value,
    ) -> Result<bool> {
        let Some(binding) = self.registry.lookup(CallbackRole::NotificationClick).await? else {
            info!("notification interaction with no registered callback; dropped");
            return Ok(false);
        };

        if let Err(err) = self.host.deliver(binding.handle, payload) {
            // Best-effort: the event is lost, not an error to the trigger.
            warn!(%err, "notification interaction delivery failed");
        }
        Ok(true)
    }
}
