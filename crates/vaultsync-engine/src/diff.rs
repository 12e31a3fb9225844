//! Manifest diffing
//!
//! Classifies the union of two manifests' paths into the five plan
//! buckets. The tie-break table is load-bearing: re-running a sync with
//! identical inputs must produce the same classification, and conflicts
//! are only declared when both sides plausibly changed since the last
//! reconciliation.
//!
//! Conflict gate caveat: the gate requires *both* modification times to
//! exceed `last_sync`. When `last_sync` is `None` (first-ever sync, or a
//! reset), no conflict can be detected from timestamps and one side's
//! changes win whenever the timestamps differ. That is the protocol's
//! documented behavior, preserved here rather than second-guessed; the
//! equal-timestamp fallback row still conflicts in full mode.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use vaultsync_core::domain::manifest::{ManifestFileRecord, VaultManifest};
use vaultsync_core::domain::plan::{
    SyncConflict, SyncDirection, SyncFileAction, SyncMode, SyncPlan,
};

/// Computes the sync plan for a local/remote manifest pair.
///
/// `include` is the path filter (exclusion globs + category allow-list);
/// paths it rejects appear in no bucket at all. Classification walks the
/// union of both filtered path sets in lexicographic order so plans are
/// deterministic and progress reporting is reproducible.
///
/// In direction-restricted modes the out-of-scope side of a one-sided
/// change is classified as unchanged: it is deliberately left untouched
/// this run, and every union path still lands in exactly one bucket.
pub fn diff_manifests(
    local: &VaultManifest,
    remote: &VaultManifest,
    mode: SyncMode,
    last_sync: Option<DateTime<Utc>>,
    mut include: impl FnMut(&str, Option<&str>) -> bool,
) -> SyncPlan {
    let local_map: BTreeMap<&str, &ManifestFileRecord> = local
        .files
        .iter()
        .filter(|r| include(&r.path, r.category.as_deref()))
        .map(|r| (r.path.as_str(), r))
        .collect();
    let remote_map: BTreeMap<&str, &ManifestFileRecord> = remote
        .files
        .iter()
        .filter(|r| include(&r.path, r.category.as_deref()))
        .map(|r| (r.path.as_str(), r))
        .collect();

    let union: BTreeSet<&str> = local_map.keys().chain(remote_map.keys()).copied().collect();

    let mut plan = SyncPlan::default();

    for path in union {
        match (local_map.get(path), remote_map.get(path)) {
            (None, Some(remote_rec)) => {
                if mode != SyncMode::Push {
                    plan.to_pull.push(pull_action(path, None, remote_rec, "new remote file"));
                } else {
                    plan.unchanged.insert(path.to_string());
                }
            }
            (Some(local_rec), None) => {
                if mode != SyncMode::Pull {
                    plan.to_push.push(push_action(path, local_rec, None, "new local file"));
                } else {
                    plan.unchanged.insert(path.to_string());
                }
            }
            (Some(local_rec), Some(remote_rec)) => {
                if !local_rec.checksum.is_empty() && local_rec.checksum == remote_rec.checksum {
                    plan.unchanged.insert(path.to_string());
                    continue;
                }

                let both_changed_since_last_sync = last_sync
                    .map(|ts| local_rec.modified > ts && remote_rec.modified > ts)
                    .unwrap_or(false);

                if both_changed_since_last_sync && mode == SyncMode::Full {
                    plan.conflicts.push(conflict(path, local_rec, remote_rec));
                } else if remote_rec.modified > local_rec.modified && mode != SyncMode::Push {
                    plan.to_pull
                        .push(pull_action(path, Some(local_rec), remote_rec, "remote newer"));
                } else if local_rec.modified > remote_rec.modified && mode != SyncMode::Pull {
                    plan.to_push
                        .push(push_action(path, local_rec, Some(remote_rec), "local newer"));
                } else {
                    // Equal timestamps, or a direction-restricted mode
                    // blocked the timestamp rows above.
                    match mode {
                        SyncMode::Full => plan.conflicts.push(conflict(path, local_rec, remote_rec)),
                        SyncMode::Pull => plan.to_pull.push(pull_action(
                            path,
                            Some(local_rec),
                            remote_rec,
                            "checksum mismatch",
                        )),
                        SyncMode::Push => plan.to_push.push(push_action(
                            path,
                            local_rec,
                            Some(remote_rec),
                            "checksum mismatch",
                        )),
                    }
                }
            }
            (None, None) => unreachable!("path came from the union of both maps"),
        }
    }

    plan
}

fn pull_action(
    path: &str,
    local: Option<&ManifestFileRecord>,
    remote: &ManifestFileRecord,
    reason: &str,
) -> SyncFileAction {
    SyncFileAction {
        path: path.to_string(),
        direction: SyncDirection::Pull,
        reason: reason.to_string(),
        local_modified: local.map(|r| r.modified),
        remote_modified: Some(remote.modified),
        size: Some(remote.size),
    }
}

fn push_action(
    path: &str,
    local: &ManifestFileRecord,
    remote: Option<&ManifestFileRecord>,
    reason: &str,
) -> SyncFileAction {
    SyncFileAction {
        path: path.to_string(),
        direction: SyncDirection::Push,
        reason: reason.to_string(),
        local_modified: Some(local.modified),
        remote_modified: remote.map(|r| r.modified),
        size: Some(local.size),
    }
}

fn conflict(
    path: &str,
    local: &ManifestFileRecord,
    remote: &ManifestFileRecord,
) -> SyncConflict {
    SyncConflict {
        path: path.to_string(),
        local_modified: local.modified,
        remote_modified: remote.modified,
        local_size: local.size,
        remote_size: remote.size,
    }
}
