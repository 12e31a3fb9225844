//! Settings for the synchronization engine.
//!
//! Provides typed settings structs supplied by the surrounding application
//! as one immutable value object per orchestrator configuration update.
//! How settings are loaded and saved is the application's concern; the
//! engine only reads them and invalidates derived caches when they change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::result::SyncStats;

/// Top-level settings value object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    pub connection: ConnectionSettings,
    pub schedule: ScheduleSettings,
    pub filters: FilterSettings,
    /// Policy applied when both sides changed the same path
    #[serde(default)]
    pub conflict_strategy: ConflictStrategy,
    /// Timestamp of the last successful sync; `None` means never synced.
    ///
    /// The conflict gate in the diff compares both sides' modification
    /// times against this value: while it is `None`, no conflicts can be
    /// detected from timestamps alone.
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    /// Summary of the last completed run, persisted by the application
    #[serde(default)]
    pub last_sync_stats: Option<SyncStats>,
}

/// Remote store connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSettings {
    /// Base URL of the remote store (e.g. `https://vault.example.com`)
    pub server_url: String,
    /// HTTP Basic username; `None` disables authentication
    #[serde(default)]
    pub username: Option<String>,
    /// HTTP Basic password
    #[serde(default)]
    pub password: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            username: None,
            password: None,
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

/// Automatic synchronization triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSettings {
    /// Whether the periodic auto-sync timer runs
    pub auto_sync_enabled: bool,
    /// Minutes between automatic syncs
    pub auto_sync_interval_minutes: u32,
    /// Sync once when the application opens
    pub sync_on_open: bool,
    /// Sync once when the application closes
    pub sync_on_close: bool,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            auto_sync_enabled: false,
            auto_sync_interval_minutes: 15,
            sync_on_open: false,
            sync_on_close: false,
        }
    }
}

/// Path filtering: category allow-list and exclusion globs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSettings {
    /// Categories to synchronize; empty means "all"
    #[serde(default)]
    pub sync_categories: Vec<String>,
    /// Glob patterns for paths to exclude (`**` crosses separators,
    /// `*` stays within one segment, `?` matches one character)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// Policy for a path whose content differs on both sides.
///
/// Unrecognized wire values deserialize to [`ConflictStrategy::NewestWins`]
/// so conflicts stay resolvable during automated runs even when settings
/// were written by a newer or foreign client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictStrategy {
    /// Discard the local copy, pull the remote version
    RemoteWins,
    /// Push the local version over the remote one
    LocalWins,
    /// Pull the remote version, preserving the local copy under a
    /// conflict-suffixed sibling path
    KeepBoth,
    /// Whichever side is strictly newer wins; ties fall to local
    #[default]
    NewestWins,
    /// Prompt the user; degrades to newest-wins where prompting is
    /// unavailable (headless contexts)
    Ask,
}

impl<'de> Deserialize<'de> for ConflictStrategy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(ConflictStrategy::parse(&value))
    }
}

impl ConflictStrategy {
    /// Parses a strategy string, falling back to the default for
    /// unrecognized values rather than failing.
    pub fn parse(s: &str) -> Self {
        match s {
            "remote-wins" => ConflictStrategy::RemoteWins,
            "local-wins" => ConflictStrategy::LocalWins,
            "keep-both" => ConflictStrategy::KeepBoth,
            "newest-wins" => ConflictStrategy::NewestWins,
            "ask" => ConflictStrategy::Ask,
            _ => ConflictStrategy::NewestWins,
        }
    }
}

impl std::fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConflictStrategy::RemoteWins => "remote-wins",
            ConflictStrategy::LocalWins => "local-wins",
            ConflictStrategy::KeepBoth => "keep-both",
            ConflictStrategy::NewestWins => "newest-wins",
            ConflictStrategy::Ask => "ask",
        };
        write!(f, "{}", s)
    }
}
