//! Persistence across process restarts.
//!
//! Simulates process death by closing the file-backed store and
//! reopening it from the same path.

use std::sync::Arc;

use geotrackd::models::callback::{CallbackBinding, CallbackHandle, CallbackRole};
use geotrackd::persistence::{db, preference_repo::PreferenceRepo};
use geotrackd::registry::CallbackRegistry;

use crate::integration::test_helpers::test_settings;

#[tokio::test]
async fn update_binding_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("geotrackd.db");

    {
        let pool = Arc::new(db::connect(&db_path).await.expect("open store"));
        let registry = CallbackRegistry::new(PreferenceRepo::new(Arc::clone(&pool)));
        registry
            .register(&CallbackBinding::new(
                CallbackRole::Update,
                CallbackHandle::new(42, "engine-old"),
            ))
            .await
            .expect("register");
        pool.close().await;
    }

    let pool = Arc::new(db::connect(&db_path).await.expect("reopen store"));
    let registry = CallbackRegistry::new(PreferenceRepo::new(pool));
    let binding = registry
        .lookup(CallbackRole::Update)
        .await
        .expect("lookup ok")
        .expect("binding survived restart");

    assert_eq!(binding.handle.raw, 42);
    // The issuer travels with the handle so a recreated execution
    // context can detect staleness and re-resolve.
    assert_eq!(binding.handle.issuer, "engine-old");
    assert!(!binding.handle.issued_by("engine-new"));
}

#[tokio::test]
async fn settings_snapshot_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("geotrackd.db");

    {
        let pool = Arc::new(db::connect(&db_path).await.expect("open store"));
        let registry = CallbackRegistry::new(PreferenceRepo::new(Arc::clone(&pool)));
        registry
            .save_settings(&test_settings())
            .await
            .expect("save settings");
        pool.close().await;
    }

    let pool = Arc::new(db::connect(&db_path).await.expect("reopen store"));
    let registry = CallbackRegistry::new(PreferenceRepo::new(pool));
    let snapshot = registry
        .settings_snapshot()
        .await
        .expect("read ok")
        .expect("snapshot survived restart");

    assert_eq!(snapshot.settings, test_settings());
}

#[tokio::test]
async fn dispatcher_identity_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("geotrackd.db");

    {
        let pool = Arc::new(db::connect(&db_path).await.expect("open store"));
        let registry = CallbackRegistry::new(PreferenceRepo::new(Arc::clone(&pool)));
        registry
            .register(&CallbackBinding::new(
                CallbackRole::Dispatcher,
                CallbackHandle::new(1000, "engine-old"),
            ))
            .await
            .expect("register dispatcher");
        pool.close().await;
    }

    let pool = Arc::new(db::connect(&db_path).await.expect("reopen store"));
    let registry = CallbackRegistry::new(PreferenceRepo::new(pool));
    assert!(registry
        .has(CallbackRole::Dispatcher)
        .await
        .expect("has ok"));
}
