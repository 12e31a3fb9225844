//! Synchronization engine for vaultsync
//!
//! The [`SyncOrchestrator`] composes the transport client, the local vault
//! store, and the conflict resolver into the full sync lifecycle:
//!
//! 1. **Plan**: build a manifest of the local tree, fetch the remote
//!    manifest, and compute a four-way diff (pull / push / conflict /
//!    delete) filtered by category and exclusion rules.
//! 2. **Execute**: apply the plan action by action, strictly sequentially,
//!    capturing per-action failures without aborting the run.
//! 3. **Sync**: the convenience composition of both.
//!
//! Also provides [`LocalVaultStore`], a disk adapter for the vault store
//! port, and [`AutoSyncScheduler`], the timer that drives periodic syncs.

pub mod diff;
pub mod error;
pub mod filter;
pub mod orchestrator;
pub mod scheduler;
pub mod vault;

pub use error::SyncEngineError;
pub use orchestrator::{ProgressSink, SyncOrchestrator};
pub use scheduler::AutoSyncScheduler;
pub use vault::LocalVaultStore;
