//! Sync plans
//!
//! A plan is the classified outcome of diffing a local manifest against a
//! remote manifest: per-path actions to pull, push, or delete, conflicts
//! whose direction is undetermined until resolved, and the set of paths
//! left untouched.
//!
//! Invariant: every path present in either manifest (after filtering)
//! appears in exactly one of the five buckets for a given run.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which directions a synchronization run considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Both directions plus conflict detection and deletes
    Full,
    /// Remote → local only; never produces conflicts
    Pull,
    /// Local → remote only; never produces conflicts
    Push,
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncMode::Full => "full",
            SyncMode::Pull => "pull",
            SyncMode::Push => "push",
        };
        write!(f, "{}", s)
    }
}

/// Direction of one planned file operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    /// Copy the remote version over the local one
    Pull,
    /// Copy the local version over the remote one
    Push,
    /// Remove the remote copy
    Delete,
}

impl std::fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncDirection::Pull => "pull",
            SyncDirection::Push => "push",
            SyncDirection::Delete => "delete",
        };
        write!(f, "{}", s)
    }
}

/// One unit of planned work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFileAction {
    /// Vault-relative path this action applies to
    pub path: String,
    /// Transfer direction
    pub direction: SyncDirection,
    /// Free-text classification of why this action was planned
    /// (e.g. "new remote file", "local newer", "conflict: remote wins")
    pub reason: String,
    /// Local modification time, when a local record exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_modified: Option<DateTime<Utc>>,
    /// Remote modification time, when a remote record exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_modified: Option<DateTime<Utc>>,
    /// Size in bytes of the version being transferred
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// A path whose content differs on both sides and which plausibly changed
/// independently on both sides since the last successful synchronization.
///
/// The direction is undetermined until the conflict resolver applies the
/// configured strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConflict {
    pub path: String,
    pub local_modified: DateTime<Utc>,
    pub remote_modified: DateTime<Utc>,
    pub local_size: u64,
    pub remote_size: u64,
}

/// The classified set of per-path actions computed by diffing two manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPlan {
    /// Remote versions to copy over local ones, in plan order
    pub to_pull: Vec<SyncFileAction>,
    /// Local versions to copy over remote ones, in plan order
    pub to_push: Vec<SyncFileAction>,
    /// Paths changed on both sides, awaiting resolution
    pub conflicts: Vec<SyncConflict>,
    /// Deletions to apply after conflicts (full mode only)
    pub to_delete: Vec<SyncFileAction>,
    /// Paths requiring no work this run
    pub unchanged: BTreeSet<String>,
}

impl SyncPlan {
    /// Total number of actions the execution phase will attempt.
    pub fn total_actions(&self) -> usize {
        self.to_pull.len() + self.to_push.len() + self.conflicts.len() + self.to_delete.len()
    }

    /// True when executing this plan would perform no work.
    pub fn is_noop(&self) -> bool {
        self.total_actions() == 0
    }

    /// Every path classified by this plan, across all five buckets.
    ///
    /// Useful for checking the partition invariant: the returned count
    /// equals the size of the filtered manifest union exactly when no
    /// path was double-classified.
    pub fn classified_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::with_capacity(self.total_actions() + self.unchanged.len());
        paths.extend(self.to_pull.iter().map(|a| a.path.as_str()));
        paths.extend(self.to_push.iter().map(|a| a.path.as_str()));
        paths.extend(self.conflicts.iter().map(|c| c.path.as_str()));
        paths.extend(self.to_delete.iter().map(|a| a.path.as_str()));
        paths.extend(self.unchanged.iter().map(|p| p.as_str()));
        paths
    }
}
