//! Live notification updates.

use geotrackd::models::settings::NotificationUpdate;

use crate::integration::test_helpers::{
    harness, test_settings, update_binding, FakeHostBehavior, SeenCommand, TEST_GRACE,
};

#[tokio::test]
async fn update_while_stopped_is_a_no_op() {
    let h = harness(FakeHostBehavior::Confirm, true, TEST_GRACE).await;

    h.controller
        .update_notification(NotificationUpdate {
            title: Some("T2".into()),
            body: None,
        })
        .await;

    assert!(
        h.host.commands().is_empty(),
        "no session runs, so no live notification may be touched"
    );
}

#[tokio::test]
async fn update_while_running_forwards_only_supplied_fields() {
    let h = harness(FakeHostBehavior::Confirm, true, TEST_GRACE).await;

    let ack = h
        .controller
        .request_start(test_settings(), vec![update_binding(42)])
        .await
        .expect("start accepted");
    ack.wait().await;

    h.controller
        .update_notification(NotificationUpdate {
            title: Some("T2".into()),
            body: None,
        })
        .await;

    // Give the fake host loop a moment to record the command.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let commands = h.host.commands();
    let update = commands
        .iter()
        .find_map(|c| match c {
            SeenCommand::UpdateNotification(u) => Some(u.clone()),
            _ => None,
        })
        .expect("notification update forwarded");
    assert_eq!(update.title.as_deref(), Some("T2"));
    assert_eq!(update.body, None, "missing fields leave current values");
}

#[tokio::test]
async fn empty_update_is_dropped_before_the_host() {
    let h = harness(FakeHostBehavior::Confirm, true, TEST_GRACE).await;

    let ack = h
        .controller
        .request_start(test_settings(), vec![update_binding(42)])
        .await
        .expect("start accepted");
    ack.wait().await;

    h.controller
        .update_notification(NotificationUpdate::default())
        .await;

    assert!(!h
        .host
        .commands()
        .iter()
        .any(|c| matches!(c, SeenCommand::UpdateNotification(_))));
}
