//! Process-backed host runner.
//!
//! Owns the supervised locator host process: spawns it on `Start`,
//! feeds it NDJSON command lines over stdin, stops it with a bounded
//! grace wait then force-kill, and reports unexpected exits upward so
//! the controller can return the session to `Stopped`.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::HostConfig;
use crate::host::{HostCommand, HostEvent, HostHandle, LaunchFlags};
use crate::models::settings::LocationSettings;

/// Interval between polls for host process exit.
const EXIT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Spawn the host runner task.
///
/// Returns the command handle for the controller, the event receiver
/// carrying [`HostEvent::Exited`] notifications, and the task handle.
#[must_use]
pub fn spawn_host_runner(
    config: HostConfig,
    state_dir: PathBuf,
    cancel: CancellationToken,
) -> (
    HostHandle,
    mpsc::Receiver<HostEvent>,
    tokio::task::JoinHandle<()>,
) {
    let (handle, mut commands) = HostHandle::channel();
    let (event_tx, event_rx) = mpsc::channel(4);

    let task = tokio::spawn(async move {
        let mut runner = Runner {
            config,
            state_dir,
            child: None,
            stdin: None,
        };
        let mut poll = tokio::time::interval(EXIT_POLL_INTERVAL);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("host runner shutting down");
                    runner.stop_child().await;
                    break;
                }
                command = commands.recv() => {
                    match command {
                        Some(command) => runner.handle_command(command).await,
                        None => {
                            runner.stop_child().await;
                            break;
                        }
                    }
                }
                _ = poll.tick() => {
                    if runner.reap_exited() {
                        let _ = event_tx.try_send(HostEvent::Exited);
                    }
                }
            }
        }
    });

    (handle, event_rx, task)
}

struct Runner {
    config: HostConfig,
    state_dir: PathBuf,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl Runner {
    async fn handle_command(&mut self, command: HostCommand) {
        match command {
            HostCommand::Start {
                settings,
                launch,
                ready,
            } => {
                if self.child.is_some() {
                    // Host already up; confirm immediately.
                    let _ = ready.send(());
                    return;
                }
                match self.spawn_child(&settings, launch) {
                    Ok(()) => {
                        info!(command = %self.config.command, "locator host process spawned");
                        let _ = ready.send(());
                    }
                    Err(err) => {
                        // Dropping `ready` signals the failure upward.
                        warn!(%err, "failed to spawn locator host process");
                    }
                }
            }
            HostCommand::Stop { done } => {
                self.stop_child().await;
                let _ = done.send(());
            }
            HostCommand::UpdateNotification(update) => {
                let line = serde_json::json!({
                    "op": "update-notification",
                    "title": update.title,
                    "body": update.body,
                });
                self.write_line(&line).await;
            }
            HostCommand::Deliver { handle, payload } => {
                let line = serde_json::json!({
                    "op": "notification-click",
                    "callback": handle,
                    "payload": payload,
                });
                self.write_line(&line).await;
            }
        }
    }

    fn spawn_child(&mut self, settings: &LocationSettings, launch: LaunchFlags) -> std::io::Result<()> {
        let settings_json =
            serde_json::to_string(settings).unwrap_or_else(|_| String::from("{}"));
        let launch_json = serde_json::to_string(&launch).unwrap_or_else(|_| String::from("{}"));

        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .env("GEOTRACKD_STATE_DIR", &self.state_dir)
            .env("GEOTRACKD_SETTINGS", settings_json)
            .env("GEOTRACKD_LAUNCH", launch_json)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        self.stdin = child.stdin.take();
        self.child = Some(child);
        Ok(())
    }

    /// Stop the child with a bounded grace wait, then force-kill.
    async fn stop_child(&mut self) {
        // Closing stdin signals the host to tear down (EOF).
        self.stdin = None;
        let Some(mut child) = self.child.take() else {
            return;
        };

        let grace = Duration::from_secs(self.config.stop_grace_seconds);
        match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(exit)) => {
                info!(?exit, "locator host process exited gracefully");
            }
            Ok(Err(err)) => {
                warn!(%err, "error waiting for locator host process");
            }
            Err(_) => {
                warn!("locator host process did not exit within grace period, forcing kill");
                if let Err(err) = child.kill().await {
                    warn!(%err, "failed to force-kill locator host process");
                }
            }
        }
    }

    /// Check whether the child exited on its own; clears it if so.
    fn reap_exited(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                warn!(%status, "locator host process exited");
                self.child = None;
                self.stdin = None;
                true
            }
            Ok(None) => false,
            Err(err) => {
                warn!(%err, "failed to poll locator host process status");
                self.child = None;
                self.stdin = None;
                true
            }
        }
    }

    async fn write_line(&mut self, value: &serde_json::Value) {
        let Some(stdin) = self.stdin.as_mut() else {
            // No process running; best-effort commands are dropped.
            return;
        };
        let mut line = value.to_string();
        line.push('\n');
        if let Err(err) = stdin.write_all(line.as_bytes()).await {
            warn!(%err, "failed to write command line to locator host");
        }
    }
}
