//! Conflict naming for keep-both resolution
//!
//! Generates sibling paths for preserved local copies, following the
//! pattern `<stem>.conflict-YYYY-MM-DD<ext>`, with a `-N` counter inserted
//! on collision: `<stem>.conflict-YYYY-MM-DD-2<ext>`, and so on.

use chrono::NaiveDate;

/// Maximum number of collision variants probed before giving up.
///
/// Exhaustion means the rename target is unresolvable; callers record
/// that as a per-conflict error rather than overwriting an existing copy.
pub const MAX_CONFLICT_PROBES: u32 = 99;

/// Generates conflict copy paths.
pub struct ConflictNamer;

impl ConflictNamer {
    /// Produces the `attempt`-th candidate path for a conflict copy.
    ///
    /// Attempt 0 carries no counter; attempt `n` (n ≥ 1) appends `-{n+1}`:
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use vaultsync_conflict::ConflictNamer;
    ///
    /// let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    /// assert_eq!(
    ///     ConflictNamer::copy_name("notes/draft.md", date, 0),
    ///     "notes/draft.conflict-2026-03-01.md"
    /// );
    /// assert_eq!(
    ///     ConflictNamer::copy_name("notes/draft.md", date, 1),
    ///     "notes/draft.conflict-2026-03-01-2.md"
    /// );
    /// ```
    pub fn copy_name(path: &str, date: NaiveDate, attempt: u32) -> String {
        let (parent, name) = match path.rsplit_once('/') {
            Some((parent, name)) => (Some(parent), name),
            None => (None, path),
        };

        let stamp = date.format("%Y-%m-%d");
        let suffix = if attempt == 0 {
            format!(".conflict-{stamp}")
        } else {
            format!(".conflict-{stamp}-{}", attempt + 1)
        };

        let renamed = if let Some(dot_pos) = name.rfind('.') {
            let stem = &name[..dot_pos];
            let ext = &name[dot_pos..];
            format!("{stem}{suffix}{ext}")
        } else {
            format!("{name}{suffix}")
        };

        match parent {
            Some(parent) => format!("{parent}/{renamed}"),
            None => renamed,
        }
    }

    /// Probes candidates until one does not collide.
    ///
    /// Returns `None` when every candidate up to [`MAX_CONFLICT_PROBES`]
    /// already exists.
    pub fn generate_unique<F>(path: &str, date: NaiveDate, mut exists: F) -> Option<String>
    where
        F: FnMut(&str) -> bool,
    {
        for attempt in 0..=MAX_CONFLICT_PROBES {
            let candidate = Self::copy_name(path, date, attempt);
            if !exists(&candidate) {
                return Some(candidate);
            }
        }
        None
    }
}
