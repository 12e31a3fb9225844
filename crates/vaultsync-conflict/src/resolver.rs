//! Conflict resolution policy
//!
//! Pure strategy evaluation: given a conflict and the configured strategy,
//! decide whether to treat it as a pull, a push, or a pull that also
//! preserves the local copy under a renamed path. The orchestrator performs
//! the actual file operations.

use tracing::debug;

use vaultsync_core::domain::plan::{SyncConflict, SyncDirection, SyncFileAction};
use vaultsync_core::settings::ConflictStrategy;

/// A conflict mapped to its resolved action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConflict {
    /// The pull or push to perform for this path
    pub action: SyncFileAction,
    /// When true, the orchestrator must first rename the local file to a
    /// conflict-suffixed sibling path before pulling
    pub preserve_local_copy: bool,
}

/// Resolves conflicts according to the configured strategy.
///
/// Stateless per call and infallible: every strategy value — including the
/// interactive `ask`, which has no prompt available in this headless core —
/// resolves deterministically. The `ask` degradation to newest-wins is
/// surfaced in the action's reason string rather than hidden.
pub struct ConflictResolver;

impl ConflictResolver {
    /// Maps one conflict plus the active strategy to exactly one action.
    pub fn resolve(conflict: &SyncConflict, strategy: ConflictStrategy) -> ResolvedConflict {
        let resolved = match strategy {
            ConflictStrategy::RemoteWins => pull(conflict, "conflict: remote wins", false),
            ConflictStrategy::LocalWins => push(conflict, "conflict: local wins"),
            ConflictStrategy::KeepBoth => pull(conflict, "conflict: keep both", true),
            ConflictStrategy::NewestWins => newest_wins(conflict, "conflict: newest wins"),
            // No interactive prompt exists here; degrade to newest-wins but
            // say so in the reason instead of pretending the user chose.
            ConflictStrategy::Ask => newest_wins(conflict, "conflict: ask unavailable, newest wins"),
        };

        debug!(
            path = %conflict.path,
            strategy = %strategy,
            direction = %resolved.action.direction,
            reason = %resolved.action.reason,
            "Conflict resolved"
        );

        resolved
    }
}

/// Whichever side is strictly newer wins; ties fall to push (local wins
/// on tie). The asymmetric tie-break keeps re-runs with identical
/// timestamps from oscillating between directions.
fn newest_wins(conflict: &SyncConflict, reason_prefix: &str) -> ResolvedConflict {
    if conflict.remote_modified > conflict.local_modified {
        pull(conflict, &format!("{reason_prefix} (remote)"), false)
    } else {
        push(conflict, &format!("{reason_prefix} (local)"))
    }
}

fn pull(conflict: &SyncConflict, reason: &str, preserve_local_copy: bool) -> ResolvedConflict {
    ResolvedConflict {
        action: SyncFileAction {
            path: conflict.path.clone(),
            direction: SyncDirection::Pull,
            reason: reason.to_string(),
            local_modified: Some(conflict.local_modified),
            remote_modified: Some(conflict.remote_modified),
            size: Some(conflict.remote_size),
        },
        preserve_local_copy,
    }
}

fn push(conflict: &SyncConflict, reason: &str) -> ResolvedConflict {
    ResolvedConflict {
        action: SyncFileAction {
            path: conflict.path.clone(),
            direction: SyncDirection::Push,
            reason: reason.to_string(),
            local_modified: Some(conflict.local_modified),
            remote_modified: Some(conflict.remote_modified),
            size: Some(conflict.local_size),
        },
        preserve_local_copy: false,
    }
}
