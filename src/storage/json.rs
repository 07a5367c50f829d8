//! JSON file preference backend.
//!
//! Values are kept in memory and the whole file is rewritten on every change
//! using an atomic write (write-to-temp + rename), so a crash never leaves a
//! half-written file behind.

use crate::domain::error::{NetmodalError, Result};
use crate::storage::backend::PreferenceStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// On-disk container.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PreferenceData {
    /// Version of the file format for future migrations.
    version: u32,

    #[serde(default)]
    values: BTreeMap<String, Value>,
}

impl Default for PreferenceData {
    fn default() -> Self {
        Self {
            version: 1,
            values: BTreeMap::new(),
        }
    }
}

/// JSON file preference backend.
///
/// # File Format
///
/// ```json
/// {
///   "version": 1,
///   "values": {
///     "filterOrder": ["xhr", "fetch", "document"],
///     "selectedFilters": ["xhr"]
///   }
/// }
/// ```
pub struct JsonPreferences {
    file_path: PathBuf,
    data: PreferenceData,
    /// Set when `data` differs from the file.
    dirty: bool,
}

impl JsonPreferences {
    /// Opens the preference file at `file_path`, creating parent directories.
    ///
    /// A missing file yields empty preferences; it is only created on the
    /// first write.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory creation fails
    /// - The file exists but cannot be read or contains invalid JSON
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use netmodal::storage::JsonPreferences;
    /// use std::path::PathBuf;
    ///
    /// let prefs = JsonPreferences::new(PathBuf::from("/tmp/netmodal/preferences.json"))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(file_path: PathBuf) -> Result<Self> {
        tracing::debug!(path = ?file_path, "opening preference file");

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = if file_path.exists() {
            Self::load_from_file(&file_path)?
        } else {
            tracing::debug!("no preference file yet, starting empty");
            PreferenceData::default()
        };

        Ok(Self {
            file_path,
            data,
            dirty: false,
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load_from_file(path: &Path) -> Result<PreferenceData> {
        let contents = std::fs::read_to_string(path)?;
        let data: PreferenceData = serde_json::from_str(&contents)
            .map_err(|e| NetmodalError::Storage(format!("failed to parse preferences: {e}")))?;

        tracing::debug!(version = data.version, keys = data.values.len(), "loaded preferences");
        Ok(data)
    }

    /// Writes the data to a temporary file, then renames it over the target.
    fn save_to_file(&mut self) -> Result<()> {
        if !self.dirty {
            tracing::trace!("skipping save, no changes");
            return Ok(());
        }

        let json = serde_json::to_string_pretty(&self.data)
            .map_err(|e| NetmodalError::Storage(format!("failed to serialize preferences: {e}")))?;

        let tmp_path = self.file_path.with_extension("tmp");
        tracing::trace!(tmp_path = ?tmp_path, "writing to temporary file");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.file_path)?;

        self.dirty = false;
        tracing::debug!(path = ?self.file_path, "preferences saved");
        Ok(())
    }
}

impl PreferenceStore for JsonPreferences {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let _span = tracing::debug_span!("json_pref_get", key = %key).entered();
        Ok(self.data.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let _span = tracing::debug_span!("json_pref_set", key = %key).entered();

        if self.data.values.get(key) == Some(&value) {
            return Ok(());
        }
        self.data.values.insert(key.to_string(), value);
        self.dirty = true;
        self.save_to_file()
    }
}

impl Drop for JsonPreferences {
    fn drop(&mut self) {
        if self.dirty {
            tracing::debug!("saving dirty preferences on drop");
            if let Err(e) = self.save_to_file() {
                tracing::error!(error = %e, "failed to save preferences on drop");
            }
        }
    }
}
