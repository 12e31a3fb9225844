//! Sync results
//!
//! A [`SyncResult`] is created once per top-level sync invocation and never
//! mutated after the run completes. Per-action failures are collected into
//! `errors` so a single unreachable file never blocks the rest of the tree;
//! a non-empty `errors` with a completed run is a qualified success.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::plan::SyncPlan;

/// One recoverable failure captured during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncErrorEntry {
    /// Path the failing action applied to, when the failure is per-file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
}

impl SyncErrorEntry {
    pub fn for_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            message: message.into(),
        }
    }
}

/// Summary of a completed synchronization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    /// Files copied remote → local
    pub pulled: u32,
    /// Files copied local → remote
    pub pushed: u32,
    /// Conflicts resolved and applied
    pub conflicts: u32,
    /// Delete actions applied
    pub deleted: u32,
    /// Paths requiring no work
    pub unchanged: u32,
    /// The plan this run executed
    pub planned: SyncPlan,
    /// Per-action failures, in the order they occurred
    pub errors: Vec<SyncErrorEntry>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl SyncResult {
    /// Starts a result for a run beginning now, executing `plan`.
    pub fn begin(plan: SyncPlan) -> Self {
        let now = Utc::now();
        Self {
            pulled: 0,
            pushed: 0,
            conflicts: 0,
            deleted: 0,
            unchanged: plan.unchanged.len() as u32,
            planned: plan,
            errors: Vec::new(),
            started_at: now,
            ended_at: now,
        }
    }

    /// True when every attempted action succeeded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// The compact summary the application persists back into settings.
    pub fn stats(&self) -> SyncStats {
        SyncStats {
            pulled: self.pulled,
            pushed: self.pushed,
            conflicts: self.conflicts,
            deleted: self.deleted,
            errors: self.errors.len() as u32,
            finished_at: self.ended_at,
        }
    }
}

/// Persisted summary of the last completed run (`SyncSettings::last_sync_stats`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub pulled: u32,
    pub pushed: u32,
    pub conflicts: u32,
    pub deleted: u32,
    pub errors: u32,
    pub finished_at: DateTime<Utc>,
}
