//! Vault manifests
//!
//! A manifest is a point-in-time snapshot of every synchronizable file's
//! identity: relative path, size, content checksum, and modification time.
//! Local and remote manifests are structurally identical and are compared
//! by path, so two copies of a file can be judged byte-identical without
//! transferring their contents.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of one file's sync-relevant identity.
///
/// Paths are vault-relative, forward-slash normalized, and unique within
/// a manifest. The checksum is a lowercase hex SHA-256 digest of the raw
/// file content; an empty checksum means "unknown" and never compares
/// equal for the purpose of change detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestFileRecord {
    /// Vault-relative path, forward-slash separated (e.g. `tasks/today.md`)
    pub path: String,
    /// File size in bytes
    pub size: u64,
    /// Hex-encoded content digest; empty when unknown
    pub checksum: String,
    /// Last modification time
    pub modified: DateTime<Utc>,
    /// Coarse grouping derived from the path's first segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ManifestFileRecord {
    /// Derives the category for a path: the first path segment, unless the
    /// path starts with a dot or has no directory component at all.
    ///
    /// ```
    /// use vaultsync_core::domain::manifest::ManifestFileRecord;
    ///
    /// assert_eq!(ManifestFileRecord::category_for_path("tasks/today.md"), Some("tasks".to_string()));
    /// assert_eq!(ManifestFileRecord::category_for_path("inbox.md"), None);
    /// assert_eq!(ManifestFileRecord::category_for_path(".trash/old.md"), None);
    /// ```
    pub fn category_for_path(path: &str) -> Option<String> {
        if path.starts_with('.') {
            return None;
        }
        match path.split_once('/') {
            Some((first, _)) if !first.is_empty() => Some(first.to_string()),
            _ => None,
        }
    }
}

/// A manifest of one file store as of a moment in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultManifest {
    /// When this manifest was generated
    pub generated_at: DateTime<Utc>,
    /// All synchronizable files, keyed by their unique relative path
    pub files: Vec<ManifestFileRecord>,
}

impl VaultManifest {
    /// Creates a manifest generated now with the given records.
    pub fn new(files: Vec<ManifestFileRecord>) -> Self {
        Self {
            generated_at: Utc::now(),
            files,
        }
    }

    /// Number of file records in the manifest.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when the manifest lists no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Builds a path → record lookup map for diffing.
    ///
    /// Later records win on duplicate paths, matching last-writer-wins
    /// normalization of malformed manifests.
    pub fn by_path(&self) -> HashMap<&str, &ManifestFileRecord> {
        self.files
            .iter()
            .map(|record| (record.path.as_str(), record))
            .collect()
    }
}
