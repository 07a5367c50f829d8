//! netmodal: a keyboard-only, vim-modal inspector for live network request
//! streams.
//!
//! netmodal consumes request lifecycle events from a capture source (a
//! browser debugging bridge, a proxy, anything that can speak the JSON-lines
//! bridge protocol), reconciles them into an ordered, bounded request list,
//! and lets you search, filter, inspect and copy requests without a mouse.

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Terminal Host (main.rs)                            │  ← crossterm, clap
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │
//! │  - App runtime, scheduler                           │
//! │  - Modal interpreter, sequences                     │
//! │  - Copy formatting                                  │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Capture       │   │ Store         │   │ UI Layer      │
//! │ (capture/)    │   │ (store/)      │   │ (ui/)         │
//! │ - Reconciler  │   │ - AppState    │   │ - VirtualList │
//! │ - Retry       │   │ - Batching    │   │ - Panels      │
//! │ - Bridge      │   │ - Fuzzy view  │   │ - Renderer    │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!         │                    │                    │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain, Tree, Storage, Infrastructure              │
//! │  - Request model, errors (domain/)                  │
//! │  - JSON tree flattening (tree/)                     │
//! │  - Filter preferences (storage/)                    │
//! │  - Platform paths (infrastructure/)                 │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │
//! │  - tracing-subscriber, rotating log file            │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: App runtime, interpreter, scheduler, actions
//! - [`capture`]: Capture source boundary and request reconciliation
//! - [`domain`]: Request model and errors
//! - [`store`]: Central state container
//! - [`tree`]: Hierarchical JSON value model
//! - [`ui`]: Virtual list, panels and ANSI rendering
//! - [`storage`]: Preference persistence
//! - [`infrastructure`]: Platform paths
//! - [`observability`]: Logging setup
//!
//! # Configuration
//!
//! Read from `config.toml` in the platform config directory
//! (`~/.config/netmodal/config.toml` on Linux) or `--config PATH`:
//!
//! ```toml
//! bridge_command = ["node", "bridge.js", "--port", "9222"]
//! theme = "catppuccin-latte"
//! trace_level = "debug"
//! buffer_rows = 8
//! ```
//!
//! # Example
//!
//! ```rust
//! use netmodal::{initialize, Config};
//! use netmodal::capture::NullSource;
//!
//! let config = Config {
//!     data_dir: Some(std::env::temp_dir().join("netmodal-doc")),
//!     ..Config::default()
//! };
//! let mut app = initialize(&config, Box::new(NullSource), 0);
//! app.start();
//! app.resize(24, 100);
//! let frame = app.render();
//! assert!(frame.contains("netmodal"));
//! ```

pub mod app;
pub mod capture;
pub mod domain;
pub mod infrastructure;
pub mod observability;
pub mod storage;
pub mod store;
pub mod tree;
pub mod ui;

pub use app::{Action, App, AppOptions, Key};
pub use domain::{NetmodalError, Request, Result};
pub use ui::Theme;

use capture::CaptureSource;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use storage::{JsonPreferences, MemoryPreferences, Preferences};

/// Application configuration.
///
/// Every field is optional in the TOML file; missing fields take the
/// defaults below.
///
/// # Example
///
/// ```rust
/// use netmodal::Config;
///
/// let config = Config::from_toml_str("theme = \"catppuccin-latte\"\nbuffer_rows = 2")?;
/// assert_eq!(config.theme.as_deref(), Some("catppuccin-latte"));
/// assert_eq!(config.buffer_rows, 2);
/// assert!(config.bridge_command.is_empty());
/// # Ok::<(), netmodal::NetmodalError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Capture bridge process argv. Empty means no capture source.
    pub bridge_command: Vec<String>,

    /// Built-in theme name.
    ///
    /// Options: `catppuccin-mocha`, `catppuccin-latte`. Ignored if
    /// `theme_file` is set and loads.
    pub theme: Option<String>,

    /// Path to a custom TOML theme file. See [`ui::theme`] for the format.
    pub theme_file: Option<PathBuf>,

    /// Log level filter.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`. Default: `"info"`
    pub trace_level: Option<String>,

    /// Where preferences and logs are kept. Default: the platform data
    /// directory.
    pub data_dir: Option<PathBuf>,

    /// Request list rows rendered beyond the viewport. Default: 5
    pub buffer_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bridge_command: Vec::new(),
            theme: None,
            theme_file: None,
            trace_level: None,
            data_dir: None,
            buffer_rows: 5,
        }
    }
}

impl Config {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`NetmodalError::Config`] if the document is not valid TOML
    /// or has unknown or mistyped fields.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| NetmodalError::Config(e.to_string()))
    }

    /// Loads the configuration file.
    ///
    /// With an explicit `path` the file must exist. Without one, the default
    /// location is tried and a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match infrastructure::config_file() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .map_err(|e| NetmodalError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Preference backend for this configuration.
    ///
    /// Falls back to in-memory preferences (with a warning) when the data
    /// directory is unavailable or the file cannot be opened.
    #[must_use]
    pub fn preferences(&self) -> Preferences {
        let opened = infrastructure::data_dir(self.data_dir.as_deref())
            .map(|dir| JsonPreferences::new(infrastructure::preferences_file(&dir)));
        match opened {
            Some(Ok(file)) => Preferences::new(Box::new(file)),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "preferences unavailable, keeping them in memory");
                Preferences::new(Box::new(MemoryPreferences::default()))
            }
            None => {
                tracing::warn!("no data directory, keeping preferences in memory");
                Preferences::new(Box::new(MemoryPreferences::default()))
            }
        }
    }
}

/// Builds the app from configuration.
///
/// # Parameters
///
/// * `config` - Loaded configuration
/// * `source` - Capture source the reconciler talks to
/// * `now` - Initial clock value in milliseconds
///
/// # Side Effects
///
/// - Loads the theme (file, then name, then default)
/// - Opens the preference file, creating the data directory
#[must_use]
pub fn initialize(config: &Config, source: Box<dyn CaptureSource>, now: u64) -> App {
    tracing::debug!("initializing netmodal");

    let theme = Theme::resolve(config.theme_file.as_deref(), config.theme.as_deref());
    let options = AppOptions {
        buffer_rows: config.buffer_rows,
        theme,
        preferences: Some(config.preferences()),
        ..AppOptions::default()
    };
    App::new(source, options, now)
}
