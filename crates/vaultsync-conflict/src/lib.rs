//! Conflict resolution for vaultsync
//!
//! Maps a detected [`SyncConflict`](vaultsync_core::domain::plan::SyncConflict)
//! plus the configured strategy to exactly one resolved action, and names
//! the conflict-suffixed sibling paths used by keep-both resolution.
//!
//! This crate performs no I/O and cannot fail: every strategy value maps
//! to a deterministic action so conflicts stay resolvable during
//! automated runs.

pub mod namer;
pub mod resolver;

pub use namer::ConflictNamer;
pub use resolver::{ConflictResolver, ResolvedConflict};
