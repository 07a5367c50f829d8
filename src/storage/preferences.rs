//! Typed access to the persisted filter preferences.

use crate::domain::error::Result;
use crate::domain::ResourceType;
use crate::storage::backend::PreferenceStore;
use crate::store::FilterState;
use serde_json::Value;
use std::collections::BTreeSet;

/// Key of the selected resource types (JSON array of type names).
pub const SELECTED_FILTERS_KEY: &str = "selectedFilters";
/// Key of the filter chip order (JSON array of type names).
pub const FILTER_ORDER_KEY: &str = "filterOrder";

/// Filter preferences on top of any [`PreferenceStore`].
pub struct Preferences {
    backend: Box<dyn PreferenceStore>,
}

impl Preferences {
    #[must_use]
    pub fn new(backend: Box<dyn PreferenceStore>) -> Self {
        Self { backend }
    }

    /// Loads the stored filter state.
    ///
    /// Missing keys fall back to defaults, unknown or duplicate type names
    /// are skipped, and types absent from a stored order are appended in
    /// their default position so every chip stays reachable. Read failures
    /// are logged and treated as absence.
    #[must_use]
    pub fn load_filter(&self) -> FilterState {
        let _span = tracing::debug_span!("load_filter").entered();

        let selected: BTreeSet<ResourceType> = self.read_types(SELECTED_FILTERS_KEY).into_iter().collect();

        let mut order = Vec::with_capacity(ResourceType::ALL.len());
        for kind in self.read_types(FILTER_ORDER_KEY).into_iter().chain(ResourceType::ALL) {
            if !order.contains(&kind) {
                order.push(kind);
            }
        }

        tracing::debug!(selected = selected.len(), "filter preferences loaded");
        FilterState { selected, order }
    }

    /// Writes both filter keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to persist either value.
    pub fn save_filter(&mut self, filter: &FilterState) -> Result<()> {
        let _span = tracing::debug_span!("save_filter", selected = filter.selected.len()).entered();

        let selected: Vec<&ResourceType> = filter.selected.iter().collect();
        self.backend.set(SELECTED_FILTERS_KEY, serde_json::to_value(selected)?)?;
        self.backend.set(FILTER_ORDER_KEY, serde_json::to_value(&filter.order)?)?;
        Ok(())
    }

    fn read_types(&self, key: &str) -> Vec<ResourceType> {
        let value = match self.backend.get(key) {
            Ok(Some(value)) => value,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to read preference");
                return Vec::new();
            }
        };
        let Value::Array(items) = value else {
            tracing::warn!(key = %key, "preference is not an array, ignoring");
            return Vec::new();
        };
        items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<ResourceType>(item).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{JsonPreferences, MemoryPreferences};
    use serde_json::json;

    #[test]
    fn absence_yields_defaults() {
        let prefs = Preferences::new(Box::new(MemoryPreferences::default()));
        assert_eq!(prefs.load_filter(), FilterState::default());
    }

    #[test]
    fn invalid_entries_are_skipped_and_missing_types_appended() {
        let mut backend = MemoryPreferences::default();
        backend.set(SELECTED_FILTERS_KEY, json!(["xhr", "bogus", 7])).unwrap();
        backend.set(FILTER_ORDER_KEY, json!(["image", "xhr", "image"])).unwrap();
        let prefs = Preferences::new(Box::new(backend));

        let filter = prefs.load_filter();
        assert_eq!(filter.selected, BTreeSet::from([ResourceType::Xhr]));
        assert_eq!(filter.order.len(), ResourceType::ALL.len());
        assert_eq!(&filter.order[..3], &[ResourceType::Image, ResourceType::Xhr, ResourceType::Fetch]);
    }

    #[test]
    fn non_array_value_is_ignored() {
        let mut backend = MemoryPreferences::default();
        backend.set(SELECTED_FILTERS_KEY, json!("xhr")).unwrap();
        let prefs = Preferences::new(Box::new(backend));
        assert!(prefs.load_filter().selected.is_empty());
    }

    #[test]
    fn saved_filter_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");

        let mut filter = FilterState::default();
        filter.selected.insert(ResourceType::Fetch);
        filter.order.swap(0, 2);

        let mut prefs = Preferences::new(Box::new(JsonPreferences::new(path.clone()).unwrap()));
        prefs.save_filter(&filter).unwrap();
        drop(prefs);

        let prefs = Preferences::new(Box::new(JsonPreferences::new(path).unwrap()));
        assert_eq!(prefs.load_filter(), filter);
    }
}
