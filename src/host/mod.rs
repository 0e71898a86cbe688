//! Background execution host interface.
//!
//! The session controller never talks to the host process directly; it
//! issues one-directional commands over a bounded channel and receives
//! readiness/termination confirmations through per-command oneshots.
//! The host runner (or a test double driving the same channel) is the
//! only consumer.

pub mod runner;

use tokio::sync::{mpsc, oneshot, watch};

use crate::models::callback::CallbackHandle;
use crate::models::settings::{LocationSettings, NotificationUpdate};
use crate::{AppError, Result};

/// Command channel depth. Commands are small and the controller
/// serializes start/stop, so a short queue suffices.
const COMMAND_QUEUE_DEPTH: usize = 16;

/// Flags telling the host which optional pluggables are registered.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LaunchFlags {
    /// An init callback is registered and must be invoked at startup.
    pub init: bool,
    /// A dispose callback is registered and must be invoked at teardown.
    pub dispose: bool,
}

/// Commands issued to the background execution host.
#[derive(Debug)]
pub enum HostCommand {
    /// Start the persistent tracking process.
    Start {
        /// Settings for the tracking session.
        settings: LocationSettings,
        /// Optional-pluggable flags derived from the callback registry.
        launch: LaunchFlags,
        /// Resolved once the host confirms readiness. Dropped without
        /// sending when the host fails to come up.
        ready: oneshot::Sender<()>,
    },
    /// Stop the persistent tracking process.
    Stop {
        /// Resolved once the host process has terminated.
        done: oneshot::Sender<()>,
    },
    /// Update the live notification text without restarting the session.
    UpdateNotification(NotificationUpdate),
    /// Deliver an out-of-band event to the execution context.
    /// Best-effort: silently dropped when no process is running.
    Deliver {
        /// Callback the execution context should invoke.
        handle: CallbackHandle,
        /// Event payload forwarded verbatim.
        payload: serde_json::Value,
    },
}

/// Events the host reports back to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The host process terminated, expectedly or not. The session
    /// returns to `Stopped` either way.
    Exited,
}

/// Sender half of the host command channel.
#[derive(Clone)]
pub struct HostHandle {
    commands: mpsc::Sender<HostCommand>,
}

impl HostHandle {
    /// Create a command channel pair: the handle for producers and the
    /// receiver for the host runner (or a test double).
    #[must_use]
    pub fn channel() -> (Self, mpsc::Receiver<HostCommand>) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        (Self { commands: tx }, rx)
    }

    /// Issue a start command, returning the readiness signal.
    ///
    /// # Errors
    ///
    /// Returns `AppError::HostUnavailable` if the host is not accepting
    /// commands.
    pub fn start(
        &self,
        settings: LocationSettings,
        launch: LaunchFlags,
    ) -> Result<oneshot::Receiver<()>> {
        let (ready_tx, ready_rx) = oneshot::channel();
        self.commands
            .try_send(HostCommand::Start {
                settings,
                launch,
                ready: ready_tx,
            })
            .map_err(|err| AppError::HostUnavailable(format!("start command refused: {err}")))?;
        Ok(ready_rx)
    }

    /// Issue a stop command, returning the termination signal.
    ///
    /// # Errors
    ///
    /// Returns `AppError::HostUnavailable` if the host is not accepting
    /// commands.
    pub fn stop(&self) -> Result<oneshot::Receiver<()>> {
        let (done_tx, done_rx) = oneshot::channel();
        self.commands
            .try_send(HostCommand::Stop { done: done_tx })
            .map_err(|err| AppError::HostUnavailable(format!("stop command refused: {err}")))?;
        Ok(done_rx)
    }

    /// Forward a partial notification update; fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns `AppError::HostUnavailable` if the host is not accepting
    /// commands.
    pub fn update_notification(&self, update: NotificationUpdate) -> Result<()> {
        self.commands
            .try_send(HostCommand::UpdateNotification(update))
            .map_err(|err| {
                AppError::HostUnavailable(format!("notification update refused: {err}"))
            })
    }

    /// Deliver an out-of-band event; fire-and-forget, best-effort.
    ///
    /// # Errors
    ///
    /// Returns `AppError::HostUnavailable` if the host is not accepting
    /// commands.
    pub fn deliver(&self, handle: CallbackHandle, payload: serde_json::Value) -> Result<()> {
        self.commands
            .try_send(HostCommand::Deliver { handle, payload })
            .map_err(|err| AppError::HostUnavailable(format!("event delivery refused: {err}")))
    }
}

/// Future-like handle resolved when a start/stop request's effect
/// becomes observable.
///
/// Resolved exactly once: by host confirmation, or by the bounded grace
/// period elapsing. The grace fallback is a liveness guarantee, not a
/// correctness one — session status may still change after the caller
/// resumes.
///
/// Tokens are cheap to clone; every clone observes the same resolution,
/// so a request collapsed onto an in-flight transition can share its
/// acknowledgement.
#[derive(Debug, Clone)]
pub struct AckToken {
    rx: watch::Receiver<bool>,
}

impl AckToken {
    /// Create an unresolved token and the sender that resolves it.
    #[must_use]
    pub fn pending() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// Create an already-resolved token, for idempotent no-op requests.
    #[must_use]
    pub fn resolved() -> Self {
        let (_tx, rx) = watch::channel(true);
        Self { rx }
    }

    /// Wait until the request's effect becomes observable.
    ///
    /// A dropped resolver counts as resolution: the caller must never
    /// block forever on an acknowledgement.
    pub async fn wait(mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                break;
            }
        }
    }
}
