//! Sync orchestrator
//!
//! Composes the transport client, the local vault store, and the conflict
//! resolver into the full sync lifecycle: plan, execute, and the
//! convenience composition of both.
//!
//! ## Failure model
//!
//! Planning is all-or-nothing: a manifest that cannot be fetched or built
//! aborts the run with a [`SyncEngineError`] and no result is produced.
//! Execution is the opposite: every action is attempted independently and
//! failures are recorded into the result's error list, so one unreachable
//! file never blocks synchronization of the rest of the tree.
//!
//! ## Concurrency
//!
//! The two manifest builds in planning run concurrently; everything else
//! is strictly sequential in plan order. The orchestrator has no
//! protection against overlapping `sync` invocations — callers serialize
//! (see [`AutoSyncScheduler`](crate::scheduler::AutoSyncScheduler)).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use vaultsync_conflict::{namer, ConflictNamer, ConflictResolver, ResolvedConflict};
use vaultsync_core::domain::manifest::{ManifestFileRecord, VaultManifest};
use vaultsync_core::domain::plan::{SyncDirection, SyncMode, SyncPlan};
use vaultsync_core::domain::progress::{SyncProgress, SyncStage};
use vaultsync_core::domain::result::{SyncErrorEntry, SyncResult};
use vaultsync_core::ports::vault_store::IVaultStore;
use vaultsync_core::settings::SyncSettings;
use vaultsync_remote::{HealthStatus, RemoteClient};

use crate::diff::diff_manifests;
use crate::error::SyncEngineError;
use crate::filter::{self, PatternCache};

/// How long a built local manifest stays valid for subsequent plans.
pub const LOCAL_MANIFEST_TTL: Duration = Duration::from_secs(10);

/// Callback receiving progress events during planning and execution.
pub type ProgressSink = dyn Fn(SyncProgress) + Send + Sync;

struct CachedManifest {
    built_at: Instant,
    manifest: VaultManifest,
}

/// Orchestrates the full synchronization lifecycle.
///
/// Holds a read-only copy of the settings, refreshed via
/// [`update_settings`](SyncOrchestrator::update_settings), which also
/// invalidates the derived caches (compiled exclusion patterns and the
/// local manifest).
pub struct SyncOrchestrator {
    client: RemoteClient,
    store: Arc<dyn IVaultStore>,
    settings: SyncSettings,
    manifest_cache: Mutex<Option<CachedManifest>>,
    pattern_cache: Mutex<PatternCache>,
    manifest_ttl: Duration,
}

impl SyncOrchestrator {
    /// Creates an orchestrator over the given store.
    ///
    /// # Errors
    /// Fails when the configured server URL is unusable.
    pub fn new(
        settings: SyncSettings,
        store: Arc<dyn IVaultStore>,
    ) -> Result<Self, SyncEngineError> {
        let client = RemoteClient::new(&settings.connection)?;
        Ok(Self {
            client,
            store,
            settings,
            manifest_cache: Mutex::new(None),
            pattern_cache: Mutex::new(PatternCache::new()),
            manifest_ttl: LOCAL_MANIFEST_TTL,
        })
    }

    /// The active settings value.
    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Replaces the settings and invalidates every derived cache.
    ///
    /// # Errors
    /// Fails when the new server URL is unusable; the previous settings
    /// stay in effect in that case.
    pub fn update_settings(&mut self, settings: SyncSettings) -> Result<(), SyncEngineError> {
        let client = RemoteClient::new(&settings.connection)?;
        self.client = client;
        self.settings = settings;
        lock(&self.manifest_cache).take();
        lock(&self.pattern_cache).clear();
        debug!("settings updated, derived caches invalidated");
        Ok(())
    }

    /// Decides whether a path participates in synchronization under the
    /// active filters.
    pub fn should_sync_path(&self, path: &str, category: Option<&str>) -> bool {
        let mut patterns = lock(&self.pattern_cache);
        filter::should_sync_path(path, category, &self.settings.filters, &mut patterns)
    }

    /// Probes the remote store for connectivity confirmation.
    pub async fn test_connection(&self) -> Result<HealthStatus, SyncEngineError> {
        Ok(self.client.health_check().await?)
    }

    // ========================================================================
    // Planning
    // ========================================================================

    /// Computes the sync plan for `mode`.
    ///
    /// Obtains the remote manifest and builds the local one concurrently,
    /// then diffs them. Restricted modes (`Pull`, `Push`) never produce
    /// conflicts.
    pub async fn plan_sync(
        &self,
        mode: SyncMode,
        on_progress: Option<&ProgressSink>,
    ) -> Result<SyncPlan, SyncEngineError> {
        emit(
            on_progress,
            SyncProgress::stage(SyncStage::Planning, "comparing local and remote manifests"),
        );

        let (remote, local) = tokio::try_join!(
            async {
                self.client
                    .fetch_manifest()
                    .await
                    .map_err(SyncEngineError::from)
            },
            self.build_local_manifest(),
        )?;

        let plan = {
            let mut patterns = lock(&self.pattern_cache);
            diff_manifests(&local, &remote, mode, self.settings.last_sync, |path, category| {
                filter::should_sync_path(path, category, &self.settings.filters, &mut patterns)
            })
        };

        info!(
            mode = %mode,
            pull = plan.to_pull.len(),
            push = plan.to_push.len(),
            conflicts = plan.conflicts.len(),
            delete = plan.to_delete.len(),
            unchanged = plan.unchanged.len(),
            "sync plan computed"
        );

        Ok(plan)
    }

    /// Builds a manifest of the local tree, breadth-first.
    ///
    /// Reserved internal paths are skipped during enumeration. A cached
    /// manifest is returned while it is younger than the TTL, avoiding
    /// redundant full-tree rescans within a short burst of calls.
    pub async fn build_local_manifest(&self) -> Result<VaultManifest, SyncEngineError> {
        if let Some(cached) = lock(&self.manifest_cache).as_ref() {
            if cached.built_at.elapsed() < self.manifest_ttl {
                debug!("serving local manifest from cache");
                return Ok(cached.manifest.clone());
            }
        }

        let mut records = Vec::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(String::new());

        while let Some(folder) = queue.pop_front() {
            let listing = match self.store.list_folder(&folder).await {
                Ok(listing) => listing,
                // Some stores refuse the empty string for the vault root
                // and expect "/" instead.
                Err(_) if folder.is_empty() => self
                    .store
                    .list_folder("/")
                    .await
                    .map_err(|e| SyncEngineError::local("/", e))?,
                Err(e) => return Err(SyncEngineError::local(folder, e)),
            };

            for sub in listing.folders {
                if !filter::is_reserved_path(&sub) {
                    queue.push_back(sub);
                }
            }

            for path in listing.files {
                if filter::is_reserved_path(&path) {
                    continue;
                }

                let data = self
                    .store
                    .read_file(&path)
                    .await
                    .map_err(|e| SyncEngineError::local(&path, e))?;
                let state = self
                    .store
                    .stat(&path)
                    .await
                    .map_err(|e| SyncEngineError::local(&path, e))?;

                records.push(ManifestFileRecord {
                    checksum: checksum_hex(&data),
                    size: data.len() as u64,
                    modified: state.modified.unwrap_or(DateTime::UNIX_EPOCH),
                    category: ManifestFileRecord::category_for_path(&path),
                    path,
                });
            }
        }

        let manifest = VaultManifest::new(records);
        debug!(files = manifest.len(), "local manifest built");

        *lock(&self.manifest_cache) = Some(CachedManifest {
            built_at: Instant::now(),
            manifest: manifest.clone(),
        });

        Ok(manifest)
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Executes a plan, stage by stage, each stage fully completed before
    /// the next begins: pulls, then pushes, then (full mode only)
    /// conflicts followed by deletes.
    ///
    /// Every action is attempted independently; a failure is captured
    /// into the result's errors and the loop continues. Always produces
    /// a result — execution has no fatal error path.
    pub async fn execute_sync(
        &self,
        plan: SyncPlan,
        mode: SyncMode,
        on_progress: Option<&ProgressSink>,
    ) -> SyncResult {
        let mut result = SyncResult::begin(plan);

        if mode != SyncMode::Push {
            let total = result.planned.to_pull.len();
            for (index, action) in result.planned.to_pull.iter().enumerate() {
                emit(
                    on_progress,
                    SyncProgress::action(SyncStage::Pulling, index + 1, total, &action.path),
                );
                match self.apply_pull(&action.path).await {
                    Ok(()) => result.pulled += 1,
                    Err(e) => {
                        warn!(path = %action.path, error = %format_chain(&e), "pull failed");
                        result
                            .errors
                            .push(SyncErrorEntry::for_path(&action.path, format_chain(&e)));
                    }
                }
            }
        }

        if mode != SyncMode::Pull {
            let total = result.planned.to_push.len();
            for (index, action) in result.planned.to_push.iter().enumerate() {
                emit(
                    on_progress,
                    SyncProgress::action(SyncStage::Pushing, index + 1, total, &action.path),
                );
                match self.apply_push(&action.path).await {
                    Ok(()) => result.pushed += 1,
                    Err(e) => {
                        warn!(path = %action.path, error = %format_chain(&e), "push failed");
                        result
                            .errors
                            .push(SyncErrorEntry::for_path(&action.path, format_chain(&e)));
                    }
                }
            }
        }

        if mode == SyncMode::Full {
            let total = result.planned.conflicts.len();
            for (index, conflict) in result.planned.conflicts.iter().enumerate() {
                emit(
                    on_progress,
                    SyncProgress::action(SyncStage::Conflicts, index + 1, total, &conflict.path),
                );

                let resolved =
                    ConflictResolver::resolve(conflict, self.settings.conflict_strategy);
                match self.apply_resolved_conflict(&resolved).await {
                    Ok(()) => result.conflicts += 1,
                    Err(e) => {
                        warn!(
                            path = %conflict.path,
                            error = %format_chain(&e),
                            "conflict resolution failed"
                        );
                        result
                            .errors
                            .push(SyncErrorEntry::for_path(&conflict.path, format_chain(&e)));
                    }
                }
            }

            let total = result.planned.to_delete.len();
            for (index, action) in result.planned.to_delete.iter().enumerate() {
                emit(
                    on_progress,
                    SyncProgress::action(SyncStage::Conflicts, index + 1, total, &action.path),
                );
                match self.apply_delete(&action.path).await {
                    Ok(()) => result.deleted += 1,
                    Err(e) => {
                        warn!(path = %action.path, error = %format_chain(&e), "delete failed");
                        result
                            .errors
                            .push(SyncErrorEntry::for_path(&action.path, format_chain(&e)));
                    }
                }
            }
        }

        result.ended_at = Utc::now();

        emit(
            on_progress,
            SyncProgress::stage(SyncStage::Complete, "synchronization complete"),
        );

        // Local state changed; the next plan must rescan.
        lock(&self.manifest_cache).take();

        info!(
            pulled = result.pulled,
            pushed = result.pushed,
            conflicts = result.conflicts,
            deleted = result.deleted,
            unchanged = result.unchanged,
            errors = result.errors.len(),
            "sync run finished"
        );

        result
    }

    /// Plans and immediately executes with the same mode.
    pub async fn sync(
        &self,
        mode: SyncMode,
        on_progress: Option<&ProgressSink>,
    ) -> Result<SyncResult, SyncEngineError> {
        let plan = self.plan_sync(mode, on_progress).await?;
        Ok(self.execute_sync(plan, mode, on_progress).await)
    }

    // ========================================================================
    // Individual actions
    // ========================================================================

    async fn apply_pull(&self, path: &str) -> anyhow::Result<()> {
        let data = self.client.get_file(path).await?;
        self.store.write_file(path, &data).await?;
        debug!(path, bytes = data.len(), "pulled");
        Ok(())
    }

    async fn apply_push(&self, path: &str) -> anyhow::Result<()> {
        let data = self.store.read_file(path).await?;
        self.client.put_file(path, &data).await?;
        debug!(path, bytes = data.len(), "pushed");
        Ok(())
    }

    async fn apply_delete(&self, path: &str) -> anyhow::Result<()> {
        self.client.delete_file(path).await?;
        debug!(path, "deleted remote copy");
        Ok(())
    }

    /// Applies one resolved conflict: rename-then-pull when the local copy
    /// is to be preserved, then the resolved pull or push.
    async fn apply_resolved_conflict(&self, resolved: &ResolvedConflict) -> anyhow::Result<()> {
        let path = &resolved.action.path;

        if resolved.preserve_local_copy {
            let copy_path = self.probe_conflict_copy_name(path).await?;
            self.store.rename(path, &copy_path).await?;
            info!(path, copy = %copy_path, "local copy preserved before pull");
        }

        match resolved.action.direction {
            SyncDirection::Pull => self.apply_pull(path).await,
            SyncDirection::Push => self.apply_push(path).await,
            SyncDirection::Delete => self.apply_delete(path).await,
        }
    }

    /// Probes for an unused conflict-copy path, date-stamped today.
    async fn probe_conflict_copy_name(&self, path: &str) -> anyhow::Result<String> {
        let today = Utc::now().date_naive();
        for attempt in 0..=namer::MAX_CONFLICT_PROBES {
            let candidate = ConflictNamer::copy_name(path, today, attempt);
            if !self.store.stat(&candidate).await?.exists {
                return Ok(candidate);
            }
        }
        anyhow::bail!("no unused conflict copy name for '{path}'")
    }
}

/// Hex-encoded SHA-256 over raw file bytes.
///
/// A cryptographic digest, not a fast rolling hash: unchanged/conflict
/// detection rides on these comparisons, so collision resistance matters
/// more than hashing throughput here.
fn checksum_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn emit(on_progress: Option<&ProgressSink>, progress: SyncProgress) {
    if let Some(sink) = on_progress {
        sink(progress);
    }
}

fn format_chain(error: &anyhow::Error) -> String {
    format!("{error:#}")
}

/// Poison-recovering lock: a panicked action loop must not wedge every
/// later run behind a poisoned mutex.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
