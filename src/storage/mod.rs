//! Storage layer for persisted user preferences.
//!
//! Preferences are small JSON values stored under string keys. The app only
//! persists the resource-type filter (selection and chip order); the
//! [`Preferences`] wrapper owns that encoding so the store never sees raw
//! JSON.
//!
//! # Modules
//!
//! - `backend`: [`PreferenceStore`] trait and the in-memory backend
//! - `json`: JSON file backend with atomic writes
//! - `preferences`: Typed access to the filter preferences

pub mod backend;
pub mod json;
pub mod preferences;

pub use backend::{MemoryPreferences, PreferenceStore};
pub use json::JsonPreferences;
pub use preferences::{Preferences, FILTER_ORDER_KEY, SELECTED_FILTERS_KEY};
