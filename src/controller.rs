//! Session controller — the core lifecycle state machine.
//!
//! Owns the process-wide session status, validates start preconditions,
//! persists settings and callback bindings, issues start/stop commands
//! to the background execution host, and produces asynchronous
//! acknowledgements. Precondition and host-command failures are
//! synchronous and leave both status and persisted state untouched;
//! everything after command issuance is acknowledged via [`AckToken`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tracing::{info, warn};

use crate::gate::PermissionGate;
use crate::host::{AckToken, HostEvent, HostHandle, LaunchFlags};
use crate::models::callback::{CallbackBinding, CallbackRole};
use crate::models::session::SessionStatus;
use crate::models::settings::{LocationSettings, NotificationUpdate};
use crate::registry::CallbackRegistry;
use crate::{AppError, Result};

/// Controller over the singleton tracking session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<SessionState>,
    host: HostHandle,
    registry: CallbackRegistry,
    gate: Arc<dyn PermissionGate>,
    ack_grace: Duration,
}

/// Status plus the acknowledgement of the in-flight transition, if any.
/// A request collapsed onto a transient status is handed a clone of the
/// pending token so it observes that transition's eventual result.
struct SessionState {
    status: SessionStatus,
    pending: Option<AckToken>,
}

impl SessionController {
    /// Build a controller over the given collaborators.
    ///
    /// `ack_grace` bounds how long an [`AckToken`] stays unresolved
    /// waiting for host confirmation before falling back to optimistic
    /// success.
    #[must_use]
    pub fn new(
        host: HostHandle,
        registry: CallbackRegistry,
        gate: Arc<dyn PermissionGate>,
        ack_grace: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SessionState {
                    status: SessionStatus::Stopped,
                    pending: None,
                }),
                host,
                registry,
                gate,
                ack_grace,
            }),
        }
    }

    /// Spawn the watcher that returns the session to `Stopped` when the
    /// host process terminates at the OS level.
    #[must_use]
    pub fn spawn_exit_watcher(
        &self,
        mut events: mpsc::Receiver<HostEvent>,
    ) -> tokio::task::JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    HostEvent::Exited => {
                        let mut state = inner.state.lock().await;
                        let from = state.status;
                        if from != SessionStatus::Stopped {
                            warn!(?from, "host process terminated; session stopped");
                            state.status = SessionStatus::Stopped;
                            state.pending = None;
                        }
                    }
                }
            }
        })
    }

    /// Request a tracking session start.
    ///
    /// Idempotent: a start re-issued while the session is `Starting`
    /// collapses onto the in-flight transition and shares its pending
    /// acknowledgement; while `Running` or `Stopping` it resolves
    /// immediately. Collapsed requests never touch persisted settings
    /// or bindings. Otherwise the bindings and settings are persisted,
    /// the host start command is issued, and the returned token
    /// resolves on host readiness or after the bounded grace period.
    ///
    /// # Errors
    ///
    /// - `AppError::InvalidSettings` if settings are malformed or no
    ///   update callback is supplied; nothing is persisted.
    /// - `AppError::PermissionDenied` if location access is not
    ///   authorized; nothing is persisted.
    /// - `AppError::HostUnavailable` if the start command is refused;
    ///   status remains `Stopped`.
    pub async fn request_start(
        &self,
        settings: LocationSettings,
        bindings: Vec<CallbackBinding>,
    ) -> Result<AckToken> {
        settings.validate()?;
        if !bindings.iter().any(|b| b.role == CallbackRole::Update) {
            return Err(AppError::InvalidSettings(
                "an update callback binding is required".into(),
            ));
        }

        let mut state = self.inner.state.lock().await;
        if state.status != SessionStatus::Stopped {
            let current = state.status;
            info!(?current, "start requested while session active; no-op");
            if current == SessionStatus::Starting {
                if let Some(pending) = &state.pending {
                    return Ok(pending.clone());
                }
            }
            return Ok(AckToken::resolved());
        }

        if !self.inner.gate.location_authorized() {
            return Err(AppError::PermissionDenied(
                "location access is not authorized".into(),
            ));
        }

        for binding in &bindings {
            self.inner.registry.register(binding).await?;
        }
        self.inner.registry.save_settings(&settings).await?;

        let launch = LaunchFlags {
            init: self.inner.registry.has(CallbackRole::Init).await?,
            dispose: self.inner.registry.has(CallbackRole::Dispose).await?,
        };

        // Command issuance failure leaves status at Stopped; the
        // transition to Starting only becomes visible once the command
        // is accepted.
        let ready = self.inner.host.start(settings, launch)?;
        state.status = SessionStatus::Starting;
        let (tx, token) = AckToken::pending();
        state.pending = Some(token.clone());
        drop(state);
        info!("tracking session starting");

        self.spawn_start_ack(ready, tx);
        Ok(token)
    }

    /// Request a tracking session stop.
    ///
    /// Idempotent: when the session is already `Stopped`, resolves
    /// immediately without issuing a host command; a stop re-issued
    /// while `Stopping` shares the in-flight acknowledgement. Persisted
    /// callback bindings are never erased — they remain available for a
    /// future restart; only the running process is terminated.
    ///
    /// # Errors
    ///
    /// Returns `AppError::HostUnavailable` if the stop command is
    /// refused; status is left unchanged.
    pub async fn request_stop(&self) -> Result<AckToken> {
        let mut state = self.inner.state.lock().await;
        if state.status == SessionStatus::Stopped {
            info!("stop requested while already stopped; no-op");
            return Ok(AckToken::resolved());
        }
        if state.status == SessionStatus::Stopping {
            if let Some(pending) = &state.pending {
                info!("stop requested while already stopping; no-op");
                return Ok(pending.clone());
            }
        }

        let done = self.inner.host.stop()?;
        state.status = SessionStatus::Stopping;
        let (tx, token) = AckToken::pending();
        state.pending = Some(token.clone());
        drop(state);
        info!("tracking session stopping");

        self.spawn_stop_ack(done, tx);
        Ok(token)
    }

    /// Whether the session is currently `Running`.
    ///
    /// Side-effect free; safe to call at any time, including before any
    /// start request.
    pub async fn is_running(&self) -> bool {
        self.inner.state.lock().await.status == SessionStatus::Running
    }

    /// Current session status.
    pub async fn status(&self) -> SessionStatus {
        self.inner.state.lock().await.status
    }

    /// Update the live notification text without restarting the session.
    ///
    /// No-op unless the session is `Running`. Only the supplied fields
    /// are forwarded; fire-and-forget, so host refusal is logged rather
    /// than surfaced.
    pub async fn update_notification(&self, update: NotificationUpdate) {
        if update.is_empty() {
            return;
        }
        let state = self.inner.state.lock().await;
        if state.status != SessionStatus::Running {
            let current = state.status;
            info!(?current, "notification update while not running; no-op");
            return;
        }
        if let Err(err) = self.inner.host.update_notification(update) {
            warn!(%err, "failed to forward notification update");
        }
    }

    fn spawn_start_ack(&self, mut ready: oneshot::Receiver<()>, tx: watch::Sender<bool>) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            match tokio::time::timeout(inner.ack_grace, &mut ready).await {
                Ok(Ok(())) => {
                    inner
                        .transition(SessionStatus::Starting, SessionStatus::Running)
                        .await;
                    let _ = tx.send(true);
                }
                Ok(Err(_)) => {
                    // Readiness sender dropped: the host failed to come
                    // up. Unblock the caller and fall back to Stopped.
                    inner
                        .transition(SessionStatus::Starting, SessionStatus::Stopped)
                        .await;
                    let _ = tx.send(true);
                }
                Err(_) => {
                    // Grace elapsed: unblock the caller now (liveness
                    // fallback), keep waiting for the real signal.
                    let _ = tx.send(true);
                    if ready.await.is_ok() {
                        inner
                            .transition(SessionStatus::Starting, SessionStatus::Running)
                            .await;
                    } else {
                        inner
                            .transition(SessionStatus::Starting, SessionStatus::Stopped)
                            .await;
                    }
                }
            }
        });
    }

    fn spawn_stop_ack(&self, mut done: oneshot::Receiver<()>, tx: watch::Sender<bool>) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            match tokio::time::timeout(inner.ack_grace, &mut done).await {
                Ok(_) => {
                    // Confirmation, or a dropped sender — either way the
                    // host is gone.
                    inner
                        .transition(SessionStatus::Stopping, SessionStatus::Stopped)
                        .await;
                    let _ = tx.send(true);
                }
                Err(_) => {
                    let _ = tx.send(true);
                    let _ = done.await;
                    inner
                        .transition(SessionStatus::Stopping, SessionStatus::Stopped)
                        .await;
                }
            }
        });
    }
}

impl Inner {
    /// Apply `from -> to` only if the session is still in `from`; the
    /// exit watcher may have moved it elsewhere in the meantime.
    async fn transition(&self, from: SessionStatus, to: SessionStatus) {
        let mut state = self.state.lock().await;
        if state.status == from && from.can_transition_to(to) {
            info!(?from, ?to, "session status transition");
            state.status = to;
        }
    }
}
