//! Local IPC server carrying the bridge protocol.
//!
//! Listens on a named pipe (Windows) or Unix domain socket (Linux/macOS)
//! using the `interprocess` crate. Accepts line-delimited JSON requests
//! from callers and `geotrackd-ctl`, and routes them through
//! [`crate::bridge::dispatch`].
//!
//! ## Protocol
//!
//! Request (one JSON object per line):
//! ```json
//! {"method": "start-tracking", "args": {"settings": {...}, "callbacks": {...}}}
//! {"method": "query-running"}
//! ```
//!
//! Response (one JSON object per line):
//! ```json
//! {"ok": true, "data": { ... } }
//! {"ok": false, "error": "invalid_settings: ..."}
//! ```

use std::sync::Arc;

use interprocess::local_socket::{tokio::prelude::*, GenericNamespaced, ListenerOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::bridge::{dispatch, AppState, BridgeRequest, BridgeResponse};
use crate::{AppError, Result};

/// Spawn the IPC server task.
///
/// # Errors
///
/// Returns `AppError::Bridge` if the listener cannot be created.
pub fn spawn_ipc_server(
    state: Arc<AppState>,
    ct: CancellationToken,
) -> Result<tokio::task::JoinHandle<()>> {
    let name = state.config.ipc_name.clone();

    let listener_name = name
        .clone()
        .to_ns_name::<GenericNamespaced>()
        .map_err(|err| AppError::Bridge(format!("invalid ipc socket name '{name}': {err}")))?;

    let listener = ListenerOptions::new()
        .name(listener_name)
        .create_tokio()
        .map_err(|err| AppError::Bridge(format!("failed to create ipc listener: {err}")))?;

    info!(ipc_name = %name, "bridge server listening");

    let handle = tokio::spawn(async move {
        let span = info_span!("bridge_server", name = %name);
        async move {
            loop {
                tokio::select! {
                    () = ct.cancelled() => {
                        info!("bridge server shutting down");
                        break;
                    }
                    accept_result = listener.accept() => {
                        match accept_result {
                            Ok(stream) => {
                                let state = Arc::clone(&state);
                                tokio::spawn(handle_connection(stream, state));
                            }
                            Err(err) => {
                                warn!(%err, "bridge accept failed");
                            }
                        }
                    }
                }
            }
        }
        .instrument(span)
        .await;
    });

    Ok(handle)
}

/// Handle a single caller connection.
async fn handle_connection(
    stream: interprocess::local_socket::tokio::Stream,
    state: Arc<AppState>,
) {
    let span = info_span!("bridge_conn");
    async move {
        let (reader, mut writer) = stream.split();
        let mut buf_reader = BufReader::new(reader);
        let mut line = String::new();

        loop {
            line.clear();
            match buf_reader.read_line(&mut line).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let response = match serde_json::from_str::<BridgeRequest>(trimmed) {
                        Ok(request) => dispatch(&state, request).await,
                        Err(err) => BridgeResponse::failure(format!("bridge: bad request: {err}")),
                    };

                    let mut payload = match serde_json::to_string(&response) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!(%err, "failed to serialize bridge response");
                            break;
                        }
                    };
                    payload.push('\n');
                    if let Err(err) = writer.write_all(payload.as_bytes()).await {
                        warn!(%err, "failed to write bridge response");
                        break;
                    }
                }
                Err(err) => {
                    warn!(%err, "failed to read bridge request");
                    break;
                }
            }
        }
    }
    .instrument(span)
    .await;
}
