//! Platform directory resolution.
//!
//! Configuration lives in the platform config directory
//! (`~/.config/netmodal` on Linux), preferences and logs in the data
//! directory (`~/.local/share/netmodal`). Both can be overridden.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "netmodal";

/// Returns the data directory, honoring an explicit override.
///
/// Returns `None` when no override is given and the platform has no data
/// directory (for example `HOME` is unset).
///
/// # Examples
///
/// ```
/// use netmodal::infrastructure::data_dir;
/// use std::path::Path;
///
/// let dir = data_dir(Some(Path::new("/srv/netmodal")));
/// assert_eq!(dir.as_deref(), Some(Path::new("/srv/netmodal")));
/// ```
#[must_use]
pub fn data_dir(override_dir: Option<&Path>) -> Option<PathBuf> {
    match override_dir {
        Some(dir) => Some(PathBuf::from(expand_tilde(&dir.to_string_lossy()))),
        None => dirs::data_dir().map(|dir| dir.join(APP_DIR)),
    }
}

/// Returns the configuration directory.
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR))
}

/// Default configuration file (`config.toml` in [`config_dir`]).
#[must_use]
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Preference file inside `data_dir`.
#[must_use]
pub fn preferences_file(data_dir: &Path) -> PathBuf {
    data_dir.join("preferences.json")
}

/// Log file inside `data_dir`.
#[must_use]
pub fn log_file(data_dir: &Path) -> PathBuf {
    data_dir.join("netmodal.log")
}

/// Expands a leading `~` to the home directory.
///
/// Paths without a tilde, and all paths when the home directory is unknown,
/// are returned unchanged.
///
/// # Examples
///
/// ```
/// use netmodal::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("/absolute/path"), "/absolute/path");
/// assert!(!expand_tilde("~/logs").starts_with('~') || dirs::home_dir().is_none());
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    let Some(home) = dirs::home_dir() else {
        return path.to_string();
    };
    if path == "~" {
        home.to_string_lossy().into_owned()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest).to_string_lossy().into_owned()
    } else {
        path.to_string()
    }
}
