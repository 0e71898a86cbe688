//! Unit tests for the session status transition table.

use geotrackd::models::session::SessionStatus;

#[test]
fn stopped_may_only_begin_starting() {
    assert!(SessionStatus::Stopped.can_transition_to(SessionStatus::Starting));
    assert!(!SessionStatus::Stopped.can_transition_to(SessionStatus::Running));
    assert!(!SessionStatus::Stopped.can_transition_to(SessionStatus::Stopping));
}

#[test]
fn starting_resolves_to_running_or_falls_back_to_stopped() {
    assert!(SessionStatus::Starting.can_transition_to(SessionStatus::Running));
    assert!(SessionStatus::Starting.can_transition_to(SessionStatus::Stopped));
    assert!(SessionStatus::Starting.can_transition_to(SessionStatus::Stopping));
}

#[test]
fn running_may_stop_gracefully_or_die() {
    assert!(SessionStatus::Running.can_transition_to(SessionStatus::Stopping));
    assert!(SessionStatus::Running.can_transition_to(SessionStatus::Stopped));
    assert!(!SessionStatus::Running.can_transition_to(SessionStatus::Starting));
}

#[test]
fn stopping_only_completes_to_stopped() {
    assert!(SessionStatus::Stopping.can_transition_to(SessionStatus::Stopped));
    assert!(!SessionStatus::Stopping.can_transition_to(SessionStatus::Running));
    assert!(!SessionStatus::Stopping.can_transition_to(SessionStatus::Starting));
}

#[test]
fn no_self_transitions() {
    for status in [
        SessionStatus::Stopped,
        SessionStatus::Starting,
        SessionStatus::Running,
        SessionStatus::Stopping,
    ] {
        assert!(!status.can_transition_to(status));
    }
}

#[test]
fn status_serializes_to_snake_case() {
    let json = serde_json::to_string(&SessionStatus::Starting).expect("serialize");
    assert_eq!(json, "\"starting\"");
}
