//! Planning tests: manifest building, diffing, filtering, fatal errors

use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use vaultsync_core::domain::plan::SyncMode;
use vaultsync_engine::SyncEngineError;
use vaultsync_remote::TransportError;

use crate::common::{self, manifest_record, mount_manifest, sha256_hex, ts};

#[tokio::test]
async fn test_plan_pulls_new_remote_file() {
    let (server, _store, orchestrator) = common::setup(|_| {}).await;
    mount_manifest(
        &server,
        vec![manifest_record("tasks/today.md", b"remote", ts(0))],
    )
    .await;

    let plan = orchestrator
        .plan_sync(SyncMode::Full, None)
        .await
        .expect("planning failed");

    assert_eq!(plan.to_pull.len(), 1);
    assert_eq!(plan.to_pull[0].path, "tasks/today.md");
    assert_eq!(plan.to_pull[0].reason, "new remote file");
    assert!(plan.to_push.is_empty());
    assert!(plan.conflicts.is_empty());
}

#[tokio::test]
async fn test_plan_unchanged_when_checksums_match() {
    let (server, store, orchestrator) = common::setup(|_| {}).await;

    let content = b"identical on both sides";
    store.seed("notes/same.md", content, ts(3));
    mount_manifest(&server, vec![manifest_record("notes/same.md", content, ts(9))]).await;

    let plan = orchestrator
        .plan_sync(SyncMode::Full, None)
        .await
        .expect("planning failed");

    // Differing timestamps don't matter when content is byte-identical.
    assert!(plan.is_noop());
    assert!(plan.unchanged.contains("notes/same.md"));
}

#[tokio::test]
async fn test_plan_remote_newer_without_last_sync() {
    // lastSyncTimestamp unset: the "both modified since last sync" gate
    // cannot open, so the newer remote side wins outright.
    let (server, store, orchestrator) = common::setup(|_| {}).await;

    store.seed("a.md", b"local version", ts(1));
    mount_manifest(&server, vec![manifest_record("a.md", b"remote version", ts(2))]).await;

    let plan = orchestrator
        .plan_sync(SyncMode::Full, None)
        .await
        .expect("planning failed");

    assert!(plan.conflicts.is_empty());
    assert_eq!(plan.to_pull.len(), 1);
    assert_eq!(plan.to_pull[0].reason, "remote newer");
}

#[tokio::test]
async fn test_plan_conflict_when_both_changed_since_last_sync() {
    // T0 < T1 < T2: both sides changed after the last reconciliation.
    let (server, store, orchestrator) = common::setup(|settings| {
        settings.last_sync = Some(ts(0));
    })
    .await;

    store.seed("a.md", b"local version", ts(1));
    mount_manifest(&server, vec![manifest_record("a.md", b"remote version", ts(2))]).await;

    let plan = orchestrator
        .plan_sync(SyncMode::Full, None)
        .await
        .expect("planning failed");

    assert_eq!(plan.conflicts.len(), 1);
    assert_eq!(plan.conflicts[0].path, "a.md");
    assert!(plan.to_pull.is_empty());
    assert!(plan.to_push.is_empty());
}

#[tokio::test]
async fn test_plan_excludes_tmp_files() {
    let (server, store, orchestrator) = common::setup(|settings| {
        settings.filters.exclude_patterns = vec!["**/*.tmp".to_string()];
    })
    .await;

    store.seed("notes/draft.tmp", b"scratch", ts(1));
    store.seed("notes/keep.md", b"keep", ts(1));
    mount_manifest(&server, vec![]).await;

    let plan = orchestrator
        .plan_sync(SyncMode::Full, None)
        .await
        .expect("planning failed");

    let pushed: Vec<&str> = plan.to_push.iter().map(|a| a.path.as_str()).collect();
    assert_eq!(pushed, vec!["notes/keep.md"]);
    assert!(!plan.classified_paths().contains(&"notes/draft.tmp"));
}

#[tokio::test]
async fn test_plan_category_allow_list() {
    let (server, store, orchestrator) = common::setup(|settings| {
        settings.filters.sync_categories = vec!["tasks".to_string()];
    })
    .await;

    store.seed("tasks/a.md", b"in scope", ts(1));
    store.seed("decisions/b.md", b"out of scope", ts(1));
    store.seed("inbox.md", b"root level", ts(1));
    mount_manifest(&server, vec![]).await;

    let plan = orchestrator
        .plan_sync(SyncMode::Full, None)
        .await
        .expect("planning failed");

    let pushed: Vec<&str> = plan.to_push.iter().map(|a| a.path.as_str()).collect();
    assert_eq!(pushed, vec!["inbox.md", "tasks/a.md"]);
    // Excluded entirely: not pulled, pushed, nor flagged unchanged.
    assert!(!plan.classified_paths().contains(&"decisions/b.md"));
}

#[tokio::test]
async fn test_plan_skips_reserved_paths_on_both_sides() {
    let (server, store, orchestrator) = common::setup(|_| {}).await;

    store.seed(".vaultsync/state.json", b"internal", ts(1));
    mount_manifest(
        &server,
        vec![manifest_record(".vaultsync/remote.json", b"internal", ts(1))],
    )
    .await;

    let plan = orchestrator
        .plan_sync(SyncMode::Full, None)
        .await
        .expect("planning failed");

    assert!(plan.is_noop());
    assert!(plan.unchanged.is_empty());
}

#[tokio::test]
async fn test_local_manifest_cache_and_invalidation() {
    let (_server, store, mut orchestrator) = common::setup(|_| {}).await;

    store.seed("a.md", b"first", ts(1));
    let first = orchestrator.build_local_manifest().await.unwrap();
    assert_eq!(first.len(), 1);

    // Within the TTL the cached manifest is served: the new file is not
    // visible yet.
    store.seed("b.md", b"second", ts(2));
    let cached = orchestrator.build_local_manifest().await.unwrap();
    assert_eq!(cached.len(), 1);

    // A settings update invalidates the cache.
    let settings = orchestrator.settings().clone();
    orchestrator.update_settings(settings).unwrap();
    let fresh = orchestrator.build_local_manifest().await.unwrap();
    assert_eq!(fresh.len(), 2);
}

#[tokio::test]
async fn test_plan_fatal_when_manifest_endpoint_fails() {
    let (server, _store, orchestrator) = common::setup(|_| {}).await;

    Mock::given(method("GET"))
        .and(path("/manifest.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = orchestrator.plan_sync(SyncMode::Full, None).await.unwrap_err();
    assert!(matches!(
        err,
        SyncEngineError::Transport(TransportError::Status { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_plan_fatal_when_manifest_malformed() {
    let (server, _store, orchestrator) = common::setup(|_| {}).await;

    Mock::given(method("GET"))
        .and(path("/manifest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let err = orchestrator.plan_sync(SyncMode::Full, None).await.unwrap_err();
    assert!(matches!(
        err,
        SyncEngineError::Transport(TransportError::Protocol(_))
    ));
}

#[tokio::test]
async fn test_should_sync_path_respects_filters() {
    let (_server, _store, orchestrator) = common::setup(|settings| {
        settings.filters.exclude_patterns = vec!["**/*.bak".to_string()];
        settings.filters.sync_categories = vec!["tasks".to_string()];
    })
    .await;

    assert!(orchestrator.should_sync_path("tasks/a.md", Some("tasks")));
    assert!(!orchestrator.should_sync_path("tasks/a.bak", Some("tasks")));
    assert!(!orchestrator.should_sync_path("decisions/b.md", Some("decisions")));
    assert!(orchestrator.should_sync_path("inbox.md", None));
    assert!(!orchestrator.should_sync_path(".vaultsync/state.json", None));
}

#[tokio::test]
async fn test_plan_checksum_uses_sha256() {
    let (server, store, orchestrator) = common::setup(|_| {}).await;

    let content = b"digest me";
    store.seed("a.md", content, ts(1));
    mount_manifest(&server, vec![]).await;

    let manifest = orchestrator.build_local_manifest().await.unwrap();
    assert_eq!(manifest.files[0].checksum, sha256_hex(content));
}
