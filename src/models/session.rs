//! Session status state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle status of the process-wide tracking session.
///
/// `Starting` and `Stopping` are transient: the only operation permitted
/// while in them is re-issuing the same request, which collapses to a
/// no-op. `Stopped` is both the initial state and the valid restart
/// point — there is no terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No session; start requests are accepted.
    Stopped,
    /// Start command issued, host readiness not yet observed.
    Starting,
    /// Host confirmed ready; location updates are being dispatched.
    Running,
    /// Stop command issued, host termination not yet observed.
    Stopping,
}

impl SessionStatus {
    /// Determine whether a lifecycle transition is permitted.
    ///
    /// `Starting -> Stopped` covers a host that dies before readiness,
    /// `Starting -> Stopping` a stop request issued before readiness,
    /// and `Running -> Stopped` process-level termination of the host
    /// observed by the exit watcher.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Stopped, Self::Starting)
                | (Self::Starting, Self::Running | Self::Stopping | Self::Stopped)
                | (Self::Running, Self::Stopping | Self::Stopped)
                | (Self::Stopping, Self::Stopped)
        )
    }
}
