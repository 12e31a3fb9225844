//! Local vault store port (driven/secondary port)
//!
//! This module defines the interface the sync engine requires from the
//! local file store: recursive enumeration, raw content I/O, stat queries,
//! folder creation, and rename. The engine does not care how it is
//! implemented (local disk, mobile sandboxed storage, an in-memory double).
//!
//! ## Design Notes
//!
//! - All paths are vault-relative, forward-slash separated strings; the
//!   empty string denotes the vault root (some stores expect `"/"` for the
//!   root instead — the engine tolerates both conventions).
//! - Uses `anyhow::Result` because store errors are adapter-specific.

use chrono::{DateTime, Utc};

/// Snapshot of one entry's state in the vault.
#[derive(Debug, Clone)]
pub struct VaultEntryState {
    /// Whether the entry exists
    pub exists: bool,
    /// Whether this is a regular file (false for folders)
    pub is_file: bool,
    /// Size in bytes (0 for folders or non-existent entries)
    pub size: u64,
    /// Last modification time (None if unavailable or entry doesn't exist)
    pub modified: Option<DateTime<Utc>>,
}

impl VaultEntryState {
    /// Returns a state representing a non-existent path.
    pub fn not_found() -> Self {
        Self {
            exists: false,
            is_file: false,
            size: 0,
            modified: None,
        }
    }

    /// Returns true if the entry exists and is a regular file.
    pub fn is_regular_file(&self) -> bool {
        self.exists && self.is_file
    }
}

/// Immediate children of one folder.
#[derive(Debug, Clone, Default)]
pub struct FolderListing {
    /// Vault-relative paths of files directly in the folder
    pub files: Vec<String>,
    /// Vault-relative paths of sub-folders directly in the folder
    pub folders: Vec<String>,
}

/// Port trait for local vault store operations.
///
/// ## Implementation Notes
///
/// - `list_folder("")` lists the vault root; implementations that only
///   accept `"/"` for the root may return an error for `""`, which callers
///   handle by retrying with `"/"`.
/// - `stat` returns [`VaultEntryState::not_found()`] for missing paths
///   rather than an error.
/// - `write_file` replaces existing content and creates parent folders.
#[async_trait::async_trait]
pub trait IVaultStore: Send + Sync {
    /// Lists the immediate children of a folder.
    async fn list_folder(&self, path: &str) -> anyhow::Result<FolderListing>;

    /// Reads the entire contents of a file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be read.
    async fn read_file(&self, path: &str) -> anyhow::Result<Vec<u8>>;

    /// Writes data to a file, creating it (and parent folders) if needed.
    async fn write_file(&self, path: &str, data: &[u8]) -> anyhow::Result<()>;

    /// Deletes a file.
    async fn delete_file(&self, path: &str) -> anyhow::Result<()>;

    /// Gets the current state of a file or folder.
    ///
    /// Returns [`VaultEntryState::not_found()`] if the path doesn't exist
    /// (does not return an error for missing paths).
    async fn stat(&self, path: &str) -> anyhow::Result<VaultEntryState>;

    /// Creates a folder and all parent folders as needed.
    async fn create_folder(&self, path: &str) -> anyhow::Result<()>;

    /// Renames a file within the vault.
    ///
    /// # Errors
    /// Returns an error if the source doesn't exist or the target cannot
    /// be created.
    async fn rename(&self, from: &str, to: &str) -> anyhow::Result<()>;
}
