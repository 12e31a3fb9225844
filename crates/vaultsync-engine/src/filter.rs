//! Path filtering: exclusion globs and category allow-lists
//!
//! Exclusion patterns use a restricted glob dialect translated to anchored
//! regular expressions: `**` matches across path separators, a single `*`
//! matches within one path segment, `?` matches exactly one non-separator
//! character, and every other character is literal. Compiled patterns are
//! cached per pattern string; the orchestrator clears the cache whenever
//! settings change.

use std::collections::HashMap;

use regex::Regex;
use tracing::warn;

use vaultsync_core::settings::FilterSettings;

/// Translates one glob pattern into an anchored [`Regex`].
///
/// ```
/// use vaultsync_engine::filter::compile_glob_pattern;
///
/// let re = compile_glob_pattern("**/*.tmp").unwrap();
/// assert!(re.is_match("notes/draft.tmp"));
/// assert!(!re.is_match("notes/draft.md"));
/// ```
pub fn compile_glob_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    translated.push_str(".*");
                } else {
                    translated.push_str("[^/]*");
                }
            }
            '?' => translated.push_str("[^/]"),
            other => translated.push_str(&regex::escape(&other.to_string())),
        }
    }

    translated.push('$');
    Regex::new(&translated)
}

/// Per-pattern-string cache of compiled exclusion globs.
///
/// Invalid patterns are compiled once, logged, and treated as matching
/// nothing — a bad exclusion must not take down planning.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: HashMap<String, Option<Regex>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `pattern` matches `path`, compiling on first use.
    pub fn matches(&mut self, pattern: &str, path: &str) -> bool {
        let compiled = self
            .compiled
            .entry(pattern.to_string())
            .or_insert_with(|| match compile_glob_pattern(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern, error = %e, "skipping invalid exclusion pattern");
                    None
                }
            });

        compiled
            .as_ref()
            .map(|re| re.is_match(path))
            .unwrap_or(false)
    }

    /// Drops every compiled pattern. Called on settings update.
    pub fn clear(&mut self) {
        self.compiled.clear();
    }

    /// Number of patterns currently cached.
    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

/// True for paths in the engine's own working namespace and other
/// dot-prefixed top-level entries (configuration directories, trash).
/// Reserved paths are never enumerated, pulled, or pushed.
pub fn is_reserved_path(path: &str) -> bool {
    path.split('/').next().unwrap_or(path).starts_with('.')
}

/// Decides whether a path participates in synchronization.
///
/// Order matters: reserved paths are rejected first, then exclusion
/// globs, then the category allow-list. Root-level files with no
/// category always pass the allow-list.
pub fn should_sync_path(
    path: &str,
    category: Option<&str>,
    filters: &FilterSettings,
    patterns: &mut PatternCache,
) -> bool {
    if is_reserved_path(path) {
        return false;
    }

    for pattern in &filters.exclude_patterns {
        if patterns.matches(pattern, path) {
            return false;
        }
    }

    if !filters.sync_categories.is_empty() {
        if let Some(category) = category {
            return filters.sync_categories.iter().any(|c| c == category);
        }
    }

    true
}
