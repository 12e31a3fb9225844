//! Local disk adapter for the vault store port
//!
//! Implements [`IVaultStore`] over `tokio::fs`, rooted at a directory.
//!
//! ## Design Decisions
//!
//! - **Atomic writes**: write-to-temp + rename, so a crash mid-write
//!   never leaves a half-pulled file at the target path.
//! - **Path sanitation**: vault-relative paths must stay inside the root;
//!   absolute paths and `..` components are rejected.
//! - **Root conventions**: both `""` and `"/"` list the vault root.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context};
use chrono::DateTime;
use tracing::debug;

use vaultsync_core::ports::vault_store::{FolderListing, IVaultStore, VaultEntryState};

/// Disk-backed vault store rooted at a directory.
#[derive(Debug, Clone)]
pub struct LocalVaultStore {
    root: PathBuf,
}

impl LocalVaultStore {
    /// Creates a store rooted at `root`. The directory must already exist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a vault-relative path onto the filesystem, rejecting escapes.
    fn resolve(&self, path: &str) -> anyhow::Result<PathBuf> {
        let trimmed = path.trim_start_matches('/');
        if trimmed.is_empty() {
            return Ok(self.root.clone());
        }

        let relative = Path::new(trimmed);
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => bail!("path '{path}' escapes the vault root"),
            }
        }

        Ok(self.root.join(relative))
    }

    /// Converts a filesystem child path back to a vault-relative string.
    fn relative(&self, full: &Path) -> Option<String> {
        let rel = full.strip_prefix(&self.root).ok()?;
        let s = rel.to_str()?;
        Some(s.replace(std::path::MAIN_SEPARATOR, "/"))
    }
}

#[async_trait::async_trait]
impl IVaultStore for LocalVaultStore {
    async fn list_folder(&self, path: &str) -> anyhow::Result<FolderListing> {
        let dir = self.resolve(path)?;
        let mut listing = FolderListing::default();

        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("listing '{path}'"))?;
        while let Some(entry) = entries.next_entry().await? {
            let Some(rel) = self.relative(&entry.path()) else {
                continue; // non-UTF-8 names are not synchronizable
            };
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                listing.folders.push(rel);
            } else if file_type.is_file() {
                listing.files.push(rel);
            }
        }

        listing.files.sort();
        listing.folders.sort();
        Ok(listing)
    }

    async fn read_file(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        let full = self.resolve(path)?;
        let data = tokio::fs::read(&full)
            .await
            .with_context(|| format!("reading '{path}'"))?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> anyhow::Result<()> {
        let target = self.resolve(path)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Temp file in the same directory so the rename stays on one
        // filesystem and is atomic.
        let tmp_path = {
            let mut p = target.as_os_str().to_owned();
            p.push(".vstmp");
            PathBuf::from(p)
        };

        tokio::fs::write(&tmp_path, data).await?;
        tokio::fs::rename(&tmp_path, &target)
            .await
            .with_context(|| format!("writing '{path}'"))?;

        debug!(path, bytes = data.len(), "file written");
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> anyhow::Result<()> {
        let full = self.resolve(path)?;
        tokio::fs::remove_file(&full)
            .await
            .with_context(|| format!("deleting '{path}'"))?;
        Ok(())
    }

    async fn stat(&self, path: &str) -> anyhow::Result<VaultEntryState> {
        let full = self.resolve(path)?;

        let metadata = match tokio::fs::metadata(&full).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(VaultEntryState::not_found());
            }
            Err(e) => return Err(e.into()),
        };

        let modified = metadata.modified().ok().and_then(|st| {
            st.duration_since(std::time::UNIX_EPOCH)
                .ok()
                .and_then(|dur| DateTime::from_timestamp(dur.as_secs() as i64, dur.subsec_nanos()))
        });

        Ok(VaultEntryState {
            exists: true,
            is_file: metadata.is_file(),
            size: metadata.len(),
            modified,
        })
    }

    async fn create_folder(&self, path: &str) -> anyhow::Result<()> {
        let full = self.resolve(path)?;
        tokio::fs::create_dir_all(&full)
            .await
            .with_context(|| format!("creating folder '{path}'"))?;
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> anyhow::Result<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&source, &target)
            .await
            .with_context(|| format!("renaming '{from}' to '{to}'"))?;
        Ok(())
    }
}
