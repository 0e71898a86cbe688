//! Bridge request decoding and dispatch.

use geotrackd::bridge::{dispatch, BridgeRequest};

use crate::integration::test_helpers::{test_app_state, FakeHostBehavior};

fn request(method: &str, args: serde_json::Value) -> BridgeRequest {
    serde_json::from_value(serde_json::json!({ "method": method, "args": args }))
        .expect("well-formed request")
}

fn start_args() -> serde_json::Value {
    serde_json::json!({
        "settings": {
            "notification_title": "T",
            "notification_body": "B",
            "notification_channel": "C",
            "interval_seconds": 5,
            "accuracy": "low",
            "distance_filter_m": 0.0,
        },
        "callbacks": {
            "update": { "raw": 42, "issuer": "engine-1" },
        },
    })
}

#[tokio::test]
async fn start_then_query_reports_running() {
    let (state, _host) = test_app_state(FakeHostBehavior::Confirm, true).await;

    let response = dispatch(&state, request("start-tracking", start_args())).await;
    assert!(response.ok, "unexpected error: {:?}", response.error);

    let response = dispatch(&state, request("query-running", serde_json::json!({}))).await;
    assert!(response.ok);
    assert_eq!(response.data.expect("data")["running"], true);
}

#[tokio::test]
async fn stop_without_session_acknowledges() {
    let (state, host) = test_app_state(FakeHostBehavior::Confirm, true).await;

    let response = dispatch(&state, request("stop-tracking", serde_json::json!({}))).await;
    assert!(response.ok);
    assert_eq!(host.stop_count(), 0);
}

#[tokio::test]
async fn malformed_start_args_map_to_invalid_settings() {
    let (state, _host) = test_app_state(FakeHostBehavior::Confirm, true).await;

    let response = dispatch(
        &state,
        request("start-tracking", serde_json::json!({"settings": {}})),
    )
    .await;
    assert!(!response.ok);
    let error = response.error.expect("error message");
    assert!(
        error.starts_with("invalid_settings:"),
        "unexpected error: {error}"
    );
}

#[tokio::test]
async fn permission_denied_surfaces_through_the_bridge() {
    let (state, _host) = test_app_state(FakeHostBehavior::Confirm, false).await;

    let response = dispatch(&state, request("start-tracking", start_args())).await;
    assert!(!response.ok);
    let error = response.error.expect("error message");
    assert!(
        error.starts_with("permission_denied:"),
        "unexpected error: {error}"
    );
}

#[tokio::test]
async fn unknown_method_is_rejected() {
    let (state, _host) = test_app_state(FakeHostBehavior::Confirm, true).await;

    let response = dispatch(&state, request("geofence-add", serde_json::json!({}))).await;
    assert!(!response.ok);
    assert!(response.error.expect("error").starts_with("bridge:"));
}

#[tokio::test]
async fn initialize_background_handler_registers_dispatcher() {
    let (state, _host) = test_app_state(FakeHostBehavior::Confirm, true).await;

    let response = dispatch(
        &state,
        request(
            "initialize-background-handler",
            serde_json::json!({"dispatcher": {"raw": 1000, "issuer": "engine-1"}}),
        ),
    )
    .await;
    assert!(response.ok);

    // The response names the live execution context so callers can
    // mint handles against it and spot stale ones after a restart.
    let data = response.data.expect("data");
    assert_eq!(data["instance"], state.instance_id);

    let registered = state
        .registry
        .has(geotrackd::models::callback::CallbackRole::Dispatcher)
        .await
        .expect("has ok");
    assert!(registered);
}

#[tokio::test]
async fn notification_interaction_reports_delivery_attempt() {
    let (state, _host) = test_app_state(FakeHostBehavior::Confirm, true).await;

    // No click callback registered: not delivered, but still ok.
    let response = dispatch(
        &state,
        request("notification-interaction", serde_json::json!({"payload": {}})),
    )
    .await;
    assert!(response.ok);
    assert_eq!(response.data.expect("data")["delivered"], false);
}

#[tokio::test]
async fn update_notification_while_stopped_acknowledges_without_host_traffic() {
    let (state, host) = test_app_state(FakeHostBehavior::Confirm, true).await;

    let response = dispatch(
        &state,
        request("update-notification", serde_json::json!({"title": "T2"})),
    )
    .await;
    assert!(response.ok);
    assert!(host.commands().is_empty());
}
