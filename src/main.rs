#![forbid(unsafe_code)]

//! `geotrackd` — background location tracking session daemon binary.
//!
//! Bootstraps configuration, the durable preference store, the host
//! runner, and the IPC bridge server, then waits for shutdown.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use geotrackd::bridge::{server, AppState};
use geotrackd::controller::SessionController;
use geotrackd::forwarder::EventForwarder;
use geotrackd::gate::ConfigGate;
use geotrackd::host::runner;
use geotrackd::models::callback::CallbackRole;
use geotrackd::persistence::{db, preference_repo::PreferenceRepo};
use geotrackd::registry::CallbackRegistry;
use geotrackd::{AppError, GlobalConfig, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "geotrackd", about = "Background location tracking session daemon", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the configured state directory.
    #[arg(long)]
    state_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format);
    info!("geotrackd daemon bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    if let Some(state_dir) = args.state_dir {
        config.state_dir = state_dir;
    }
    let config = Arc::new(config);
    info!(state_dir = %config.state_dir.display(), "configuration loaded");

    // Fresh identity per bootstrap; persisted callback handles issued
    // by earlier instances are stale against this one.
    let instance_id = Uuid::new_v4().to_string();
    info!(%instance_id, "execution context instance id minted");

    // ── Open the preference store ───────────────────────
    let pool = Arc::new(db::connect(&config.db_path()).await?);
    let repo = PreferenceRepo::new(Arc::clone(&pool));
    let registry = CallbackRegistry::new(repo);
    info!("preference store opened");

    // ── Restart recovery ────────────────────────────────
    // Persisted bindings and the settings snapshot let a recreated
    // execution context resume dispatching without a fresh start
    // request; the session itself always restarts Stopped.
    match registry.settings_snapshot().await? {
        Some(snapshot) => {
            let dispatcher = registry.has(CallbackRole::Dispatcher).await?;
            info!(
                saved_at = %snapshot.saved_at,
                dispatcher_registered = dispatcher,
                "persisted session state found from a previous run"
            );
        }
        None => info!("no persisted session state; fresh install"),
    }

    // ── Host runner, controller, forwarder ──────────────
    let ct = CancellationToken::new();
    let (host, host_events, host_task) = runner::spawn_host_runner(
        config.host.clone(),
        config.state_dir.clone(),
        ct.clone(),
    );
    let gate = Arc::new(ConfigGate::new(&config.permission));
    let controller = SessionController::new(
        host.clone(),
        registry.clone(),
        gate,
        Duration::from_secs(config.host.start_grace_seconds),
    );
    let exit_watcher = controller.spawn_exit_watcher(host_events);
    let forwarder = EventForwarder::new(registry.clone(), host);

    // ── Bridge server ───────────────────────────────────
    let state = Arc::new(AppState {
        config: Arc::clone(&config),
        instance_id,
        controller: controller.clone(),
        registry,
        forwarder,
    });
    let server_task = server::spawn_ipc_server(state, ct.clone())?;
    info!("geotrackd ready");

    // ── Wait for shutdown ───────────────────────────────
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for ctrl-c");
    }
    info!("shutdown requested");

    // Stop any live session so the host process is not orphaned, then
    // cancel the long-lived tasks.
    match controller.request_stop().await {
        Ok(ack) => ack.wait().await,
        Err(err) => warn!(%err, "failed to stop session during shutdown"),
    }
    ct.cancel();
    let _ = server_task.await;
    let _ = host_task.await;
    exit_watcher.abort();
    info!("geotrackd stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => fmt().with_env_filter(filter).init(),
        LogFormat::Json => fmt().json().with_env_filter(filter).init(),
    }
}
