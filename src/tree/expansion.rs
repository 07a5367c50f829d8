//! Per-path expand/collapse state.

use std::collections::BTreeMap;

/// Expansion state keyed by structural path.
///
/// Paths that were never toggled are expanded. Every mutation bumps a
/// revision counter so derived node sequences know when to rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionMap {
    entries: BTreeMap<String, bool>,
    revision: u64,
}

impl ExpansionMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `path` is expanded (default: expanded).
    #[must_use]
    pub fn is_expanded(&self, path: &str) -> bool {
        self.entries.get(path).copied().unwrap_or(true)
    }

    /// Sets the state at `path`; returns true if it changed.
    pub fn set(&mut self, path: &str, expanded: bool) -> bool {
        if self.is_expanded(path) == expanded {
            return false;
        }
        self.entries.insert(path.to_string(), expanded);
        self.revision = self.revision.wrapping_add(1);
        true
    }

    /// Flips the state at `path` and returns the new state.
    pub fn toggle(&mut self, path: &str) -> bool {
        let next = !self.is_expanded(path);
        self.set(path, next);
        next
    }

    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}
