//! Notification-interaction forwarding.

use geotrackd::forwarder::EventForwarder;
use geotrackd::models::callback::{CallbackBinding, CallbackHandle, CallbackRole};

use crate::integration::test_helpers::{
    memory_registry, spawn_fake_host, FakeHostBehavior, SeenCommand,
};

#[tokio::test]
async fn interaction_without_registered_callback_is_silently_dropped() {
    let (handle, host) = spawn_fake_host(FakeHostBehavior::Confirm);
    let registry = memory_registry().await;
    let forwarder = EventForwarder::new(registry, handle);

    let delivered = forwarder
        .forward_notification_interaction(serde_json::json!({"source": "tap"}))
        .await
        .expect("forwarding never errors toward the trigger");

    assert!(!delivered, "absent handler means delivery not attempted");
    assert!(host.commands().is_empty());
}

#[tokio::test]
async fn interaction_with_registered_callback_is_delivered() {
    let (handle, host) = spawn_fake_host(FakeHostBehavior::Confirm);
    let registry = memory_registry().await;
    registry
        .register(&CallbackBinding::new(
            CallbackRole::NotificationClick,
            CallbackHandle::new(77, "engine-1"),
        ))
        .await
        .expect("register click callback");
    let forwarder = EventForwarder::new(registry, handle);

    let delivered = forwarder
        .forward_notification_interaction(serde_json::json!({"source": "tap"}))
        .await
        .expect("forward ok");
    assert!(delivered);

    // Give the fake host loop a moment to record the command.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let commands = host.commands();
    let Some(SeenCommand::Deliver { handle, payload }) = commands.first() else {
        panic!("expected a deliver command, got {commands:?}");
    };
    assert_eq!(handle.raw, 77);
    assert_eq!(payload["source"], "tap");
}
