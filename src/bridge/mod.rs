//! Caller-facing bridge: request/response dispatch.
//!
//! Each request names a method and carries a structured argument map.
//! Arguments are decoded exactly once at this boundary into the typed
//! entities of [`crate::models`]; invalid shapes map directly to
//! `invalid_settings` errors. Transport is provided by
//! [`server`] — one JSON object per line over a local socket.

pub mod server;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::GlobalConfig;
use crate::controller::SessionController;
use crate::forwarder::EventForwarder;
use crate::models::callback::{CallbackBinding, CallbackHandle, CallbackRole};
use crate::models::settings::{LocationSettings, NotificationUpdate};
use crate::registry::CallbackRegistry;
use crate::{AppError, Result};

/// Shared state handed to every bridge request.
pub struct AppState {
    /// Global daemon configuration.
    pub config: Arc<GlobalConfig>,
    /// Identity of this daemon execution context, minted fresh at every
    /// bootstrap. Callback handles are only valid against the instance
    /// that issued them; callers compare this value to a handle's
    /// issuer to detect staleness across restarts.
    pub instance_id: String,
    /// Session lifecycle controller.
    pub controller: SessionController,
    /// Durable callback registry.
    pub registry: CallbackRegistry,
    /// Notification-interaction forwarder.
    pub forwarder: EventForwarder,
}

/// Inbound bridge request: method name plus argument map.
#[derive(Debug, Deserialize)]
pub struct BridgeRequest {
    /// Operation name, e.g. `start-tracking`.
    pub method: String,
    /// Structured arguments; defaults to an empty map.
    #[serde(default = "empty_args")]
    pub args: serde_json::Value,
}

fn empty_args() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Outbound bridge response.
#[derive(Debug, Serialize)]
pub struct BridgeResponse {
    /// Whether the request succeeded.
    pub ok: bool,
    /// Payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Error message on failure, prefixed with the taxonomy code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeResponse {
    /// Successful response carrying `data`.
    #[must_use]
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed response carrying an error message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Callback identities supplied with a start request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
struct StartCallbacks {
    /// Required update callback, invoked per location sample.
    update: CallbackHandle,
    /// Optional init callback.
    #[serde(default)]
    init: Option<CallbackHandle>,
    /// Optional structured payload passed to the init callback once.
    #[serde(default)]
    init_data: Option<serde_json::Value>,
    /// Optional dispose callback.
    #[serde(default)]
    dispose: Option<CallbackHandle>,
    /// Optional notification-click callback.
    #[serde(default)]
    on_notification_click: Option<CallbackHandle>,
}

/// `start-tracking` argument shape.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
struct StartTrackingArgs {
    settings: LocationSettings,
    callbacks: StartCallbacks,
}

/// `initialize-background-handler` argument shape.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
struct InitializeArgs {
    dispatcher: CallbackHandle,
}

/// `notification-interaction` argument shape.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
struct InteractionArgs {
    #[serde(default)]
    payload: serde_json::Value,
}

fn decode<T: DeserializeOwned>(method: &str, args: serde_json::Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|err| AppError::InvalidSettings(format!("invalid {method} arguments: {err}")))
}

/// Dispatch one bridge request to the owning component.
///
/// Never panics and never returns a transport-level error: every
/// outcome, including decode failures and unknown methods, is folded
/// into the response envelope.
pub async fn dispatch(state: &AppState, request: BridgeRequest) -> BridgeResponse {
    info!(method = %request.method, "bridge request");
    match handle(state, &request.method, request.args).await {
        Ok(data) => BridgeResponse::success(data),
        Err(err) => BridgeResponse::failure(err.to_string()),
    }
}

async fn handle(
    state: &AppState,
    method: &str,
    args: serde_json::Value,
) -> Result<serde_json::Value> {
    match method {
        "initialize-background-handler" => {
            let input: InitializeArgs = decode(method, args)?;
            state
                .registry
                .register(&CallbackBinding::new(
                    CallbackRole::Dispatcher,
                    input.dispatcher,
                ))
                .await?;
            Ok(serde_json::json!({
                "acknowledged": true,
                "instance": state.instance_id,
            }))
        }
        "start-tracking" => {
            let input: StartTrackingArgs = decode(method, args)?;
            let bindings = collect_bindings(input.callbacks);
            let ack = state
                .controller
                .request_start(input.settings, bindings)
                .await?;
            ack.wait().await;
            Ok(serde_json::json!({ "acknowledged": true }))
        }
        "stop-tracking" => {
            let ack = state.controller.request_stop().await?;
            ack.wait().await;
            Ok(serde_json::json!({ "acknowledged": true }))
        }
        "query-running" => {
            let running = state.controller.is_running().await;
            Ok(serde_json::json!({ "running": running }))
        }
        "update-notification" => {
            let update: NotificationUpdate = decode(method, args)?;
            state.controller.update_notification(update).await;
            Ok(serde_json::json!({ "acknowledged": true }))
        }
        "notification-interaction" => {
            let input: InteractionArgs = decode(method, args)?;
            let delivered = state
                .forwarder
                .forward_notification_interaction(input.payload)
                .await?;
            Ok(serde_json::json!({ "delivered": delivered }))
        }
        other => Err(AppError::Bridge(format!("unknown method: {other}"))),
    }
}

fn collect_bindings(callbacks: StartCallbacks) -> Vec<CallbackBinding> {
    let mut bindings = vec![CallbackBinding::new(CallbackRole::Update, callbacks.update)];
    if let Some(init) = callbacks.init {
        let mut binding = CallbackBinding::new(CallbackRole::Init, init);
        if let Some(data) = callbacks.init_data {
            binding = binding.with_aux_data(data);
        }
        bindings.push(binding);
    }
    if let Some(dispose) = callbacks.dispose {
        bindings.push(CallbackBinding::new(CallbackRole::Dispose, dispose));
    }
    if let Some(click) = callbacks.on_notification_click {
        bindings.push(CallbackBinding::new(CallbackRole::NotificationClick, click));
    }
    bindings
}
