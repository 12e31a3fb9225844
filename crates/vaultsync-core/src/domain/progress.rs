//! Progress events
//!
//! Transient values emitted while a plan executes, consumed by the
//! presentation layer for status panels. Never persisted.

use serde::{Deserialize, Serialize};

/// Which phase of a synchronization run is underway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStage {
    Planning,
    Pulling,
    Pushing,
    Conflicts,
    Complete,
}

impl std::fmt::Display for SyncStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncStage::Planning => "planning",
            SyncStage::Pulling => "pulling",
            SyncStage::Pushing => "pushing",
            SyncStage::Conflicts => "conflicts",
            SyncStage::Complete => "complete",
        };
        write!(f, "{}", s)
    }
}

/// One progress event: stage plus current/total counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    pub stage: SyncStage,
    /// Index of the action about to be attempted (1-based within the stage)
    pub current: usize,
    /// Total actions in this stage
    pub total: usize,
    /// Path of the action about to be attempted, when applicable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Human-readable stage label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SyncProgress {
    /// A stage-level event with no per-path detail.
    pub fn stage(stage: SyncStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            current: 0,
            total: 0,
            path: None,
            message: Some(message.into()),
        }
    }

    /// A per-action event with counters and the path being worked on.
    pub fn action(stage: SyncStage, current: usize, total: usize, path: &str) -> Self {
        Self {
            stage,
            current,
            total,
            path: Some(path.to_string()),
            message: None,
        }
    }
}
