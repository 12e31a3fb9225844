//! Error types for the sync engine
//!
//! Only failures in the planning phase surface here: a manifest that
//! cannot be fetched or built leaves nothing to diff against. Failures of
//! individual actions during execution are recorded into
//! [`SyncResult::errors`](vaultsync_core::domain::result::SyncResult)
//! instead and never abort the run.

use thiserror::Error;

use vaultsync_remote::TransportError;

/// A fatal synchronization failure: no result object is produced.
#[derive(Debug, Error)]
pub enum SyncEngineError {
    /// The remote manifest could not be fetched or parsed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The local store failed while the local manifest was being built
    #[error("local store error at '{path}': {source}")]
    LocalStore {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl SyncEngineError {
    /// Wraps a local store failure with the path being worked on.
    pub(crate) fn local(path: impl Into<String>, source: anyhow::Error) -> Self {
        Self::LocalStore {
            path: path.into(),
            source,
        }
    }
}
