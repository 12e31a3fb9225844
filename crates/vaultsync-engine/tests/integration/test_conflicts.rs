//! Conflict application tests: strategy outcomes end to end, keep-both
//! rename probing, per-conflict error capture

use chrono::Utc;
use wiremock::matchers::{body_bytes, method, path};
use wiremock::{Mock, ResponseTemplate};

use vaultsync_conflict::ConflictNamer;
use vaultsync_core::domain::plan::SyncMode;
use vaultsync_core::settings::ConflictStrategy;

use crate::common::{self, manifest_record, mount_file, mount_manifest, mount_uploads_ok, ts};

/// Seeds a conflict: both sides changed `tasks/today.md` after last sync.
/// Local carries `old local`, remote carries `new remote`, remote is newer.
async fn conflict_fixture(
    strategy: ConflictStrategy,
) -> (
    wiremock::MockServer,
    std::sync::Arc<common::MemoryVaultStore>,
    vaultsync_engine::SyncOrchestrator,
) {
    let (server, store, orchestrator) = common::setup(|settings| {
        settings.conflict_strategy = strategy;
        settings.last_sync = Some(ts(0));
    })
    .await;

    store.seed("tasks/today.md", b"old local", ts(1));
    mount_manifest(
        &server,
        vec![manifest_record("tasks/today.md", b"new remote", ts(2))],
    )
    .await;
    mount_file(&server, "tasks/today.md", b"new remote").await;

    (server, store, orchestrator)
}

#[tokio::test]
async fn test_keep_both_preserves_local_copy() {
    let (_server, store, orchestrator) = conflict_fixture(ConflictStrategy::KeepBoth).await;

    let result = orchestrator
        .sync(SyncMode::Full, None)
        .await
        .expect("sync failed");

    assert_eq!(result.conflicts, 1);
    assert!(result.is_clean());

    // The original path now holds the pulled remote content.
    assert_eq!(
        store.contents("tasks/today.md").as_deref(),
        Some(b"new remote".as_slice())
    );

    // The pre-existing local content survives under the conflict suffix.
    let copy = ConflictNamer::copy_name("tasks/today.md", Utc::now().date_naive(), 0);
    assert_eq!(store.contents(&copy).as_deref(), Some(b"old local".as_slice()));

    // <stem>.conflict-<date><ext>
    let copy_re = regex::Regex::new(r"^tasks/today\.conflict-\d{4}-\d{2}-\d{2}\.md$").unwrap();
    assert!(copy_re.is_match(&copy));
}

#[tokio::test]
async fn test_keep_both_probes_past_existing_copy() {
    let (server, store, orchestrator) = conflict_fixture(ConflictStrategy::KeepBoth).await;

    // Occupy today's first candidate; the probe must move to the -2 variant.
    // The occupying file is local-only, so the push stage will also try to
    // upload it; let uploads succeed so the run stays clean.
    mount_uploads_ok(&server).await;
    let today = Utc::now().date_naive();
    let first = ConflictNamer::copy_name("tasks/today.md", today, 0);
    store.seed(&first, b"yesterday's conflict", ts(1));

    let result = orchestrator
        .sync(SyncMode::Full, None)
        .await
        .expect("sync failed");
    assert_eq!(result.conflicts, 1);

    let second = ConflictNamer::copy_name("tasks/today.md", today, 1);
    assert_eq!(store.contents(&second).as_deref(), Some(b"old local".as_slice()));
    assert_eq!(
        store.contents(&first).as_deref(),
        Some(b"yesterday's conflict".as_slice())
    );
}

#[tokio::test]
async fn test_remote_wins_discards_local() {
    let (_server, store, orchestrator) = conflict_fixture(ConflictStrategy::RemoteWins).await;

    let result = orchestrator
        .sync(SyncMode::Full, None)
        .await
        .expect("sync failed");

    assert_eq!(result.conflicts, 1);
    assert_eq!(
        store.contents("tasks/today.md").as_deref(),
        Some(b"new remote".as_slice())
    );
    // No conflict copy: the local version is gone.
    assert_eq!(store.paths(), vec!["tasks/today.md".to_string()]);
}

#[tokio::test]
async fn test_local_wins_pushes_local_content() {
    let (server, store, orchestrator) = conflict_fixture(ConflictStrategy::LocalWins).await;

    Mock::given(method("PUT"))
        .and(path("/files/tasks/today.md"))
        .and(body_bytes(b"old local".to_vec()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("MKCOL"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;

    let result = orchestrator
        .sync(SyncMode::Full, None)
        .await
        .expect("sync failed");

    assert_eq!(result.conflicts, 1);
    // Local content untouched.
    assert_eq!(
        store.contents("tasks/today.md").as_deref(),
        Some(b"old local".as_slice())
    );
}

#[tokio::test]
async fn test_newest_wins_pulls_newer_remote() {
    let (_server, store, orchestrator) = conflict_fixture(ConflictStrategy::NewestWins).await;

    let result = orchestrator
        .sync(SyncMode::Full, None)
        .await
        .expect("sync failed");

    assert_eq!(result.conflicts, 1);
    assert_eq!(
        store.contents("tasks/today.md").as_deref(),
        Some(b"new remote".as_slice())
    );
}

#[tokio::test]
async fn test_newest_wins_tie_pushes_local() {
    // Equal timestamps on both sides: the tie must fall to push so
    // repeated runs cannot oscillate.
    let (server, store, orchestrator) = common::setup(|settings| {
        settings.conflict_strategy = ConflictStrategy::NewestWins;
        settings.last_sync = Some(ts(0));
    })
    .await;

    store.seed("tie.md", b"local side", ts(3));
    mount_manifest(&server, vec![manifest_record("tie.md", b"remote side", ts(3))]).await;

    Mock::given(method("PUT"))
        .and(path("/files/tie.md"))
        .and(body_bytes(b"local side".to_vec()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let result = orchestrator
        .sync(SyncMode::Full, None)
        .await
        .expect("sync failed");

    assert_eq!(result.conflicts, 1);
    assert_eq!(store.contents("tie.md").as_deref(), Some(b"local side".as_slice()));
}

#[tokio::test]
async fn test_conflict_failure_recorded_not_fatal() {
    let (server, store, orchestrator) = common::setup(|settings| {
        settings.conflict_strategy = ConflictStrategy::RemoteWins;
        settings.last_sync = Some(ts(0));
    })
    .await;

    store.seed("broken.md", b"local", ts(1));
    store.seed("fine.md", b"also local", ts(1));
    mount_manifest(
        &server,
        vec![
            manifest_record("broken.md", b"remote a", ts(2)),
            manifest_record("fine.md", b"remote b", ts(2)),
        ],
    )
    .await;
    // broken.md's content endpoint fails; fine.md's works.
    Mock::given(method("GET"))
        .and(path("/files/broken.md"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_file(&server, "fine.md", b"remote b").await;

    let result = orchestrator
        .sync(SyncMode::Full, None)
        .await
        .expect("a failing conflict must not abort the run");

    assert_eq!(result.conflicts, 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path.as_deref(), Some("broken.md"));
    assert_eq!(store.contents("fine.md").as_deref(), Some(b"remote b".as_slice()));
}
