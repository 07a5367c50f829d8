//! Preference backend abstraction.
//!
//! The [`PreferenceStore`] trait is a plain key-value interface over JSON
//! values. Backends decide where values live; they never interpret them.

use crate::domain::error::Result;
use serde_json::Value;
use std::collections::HashMap;

/// Key-value persistence for preference values.
///
/// # Implementations
///
/// - [`crate::storage::JsonPreferences`]: JSON file with atomic writes
/// - [`MemoryPreferences`]: process-local map, used in tests and when no
///   data directory is available
///
/// # Examples
///
/// ```
/// use netmodal::storage::{MemoryPreferences, PreferenceStore};
///
/// let mut prefs = MemoryPreferences::default();
/// prefs.set("selectedFilters", serde_json::json!(["xhr"]))?;
/// assert_eq!(prefs.get("selectedFilters")?, Some(serde_json::json!(["xhr"])));
/// # Ok::<(), netmodal::domain::NetmodalError>(())
/// ```
pub trait PreferenceStore: Send {
    /// Reads the value stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
}

/// In-memory preference backend.
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferences {
    values: HashMap<String, Value>,
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}
