//! Unit tests for the key/value preference repository.

use std::sync::Arc;

use geotrackd::persistence::{db, preference_repo::PreferenceRepo};

async fn repo() -> PreferenceRepo {
    let pool = Arc::new(db::connect_memory().await.expect("connect memory store"));
    PreferenceRepo::new(pool)
}

#[tokio::test]
async fn get_missing_key_returns_none() {
    let repo = repo().await;
    assert_eq!(repo.get("locator.absent").await.expect("get ok"), None);
    assert!(!repo.has("locator.absent").await.expect("has ok"));
}

#[tokio::test]
async fn set_then_get_round_trips() {
    let repo = repo().await;
    repo.set("locator.k", "v1").await.expect("set ok");
    assert_eq!(
        repo.get("locator.k").await.expect("get ok"),
        Some("v1".to_owned())
    );
    assert!(repo.has("locator.k").await.expect("has ok"));
}

#[tokio::test]
async fn set_overwrites_atomically_per_key() {
    let repo = repo().await;
    repo.set("locator.k", "v1").await.expect("set ok");
    repo.set("locator.k", "v2").await.expect("overwrite ok");
    assert_eq!(
        repo.get("locator.k").await.expect("get ok"),
        Some("v2".to_owned())
    );
}

#[tokio::test]
async fn remove_is_idempotent() {
    let repo = repo().await;
    repo.set("locator.k", "v1").await.expect("set ok");
    repo.remove("locator.k").await.expect("remove ok");
    repo.remove("locator.k").await.expect("second remove ok");
    assert_eq!(repo.get("locator.k").await.expect("get ok"), None);
}

#[tokio::test]
async fn json_helpers_round_trip() {
    let repo = repo().await;
    let value = serde_json::json!({"raw": 42, "issuer": "engine-1"});
    repo.set_json("locator.j", &value).await.expect("set ok");
    let decoded: Option<serde_json::Value> = repo.get_json("locator.j").await.expect("get ok");
    assert_eq!(decoded, Some(value));
}

#[tokio::test]
async fn corrupt_json_surfaces_a_store_error() {
    let repo = repo().await;
    repo.set("locator.j", "not-json").await.expect("set ok");
    let result: geotrackd::Result<Option<serde_json::Value>> = repo.get_json("locator.j").await;
    assert!(matches!(result, Err(geotrackd::AppError::Store(_))));
}
