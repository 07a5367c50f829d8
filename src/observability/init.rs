//! Tracing initialization and subscriber setup.

use super::file_writer::RotatingFile;
use crate::infrastructure::{data_dir, log_file};
use crate::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the tracing subscriber writing to the rotating log file.
///
/// # Parameters
///
/// * `config` - Configuration providing `trace_level` and `data_dir`
///
/// # Level Resolution
///
/// 1. `RUST_LOG` environment variable
/// 2. `config.trace_level`
/// 3. Default: `"info"`
///
/// # Initialization Behavior
///
/// - Creates the data directory if it doesn't exist
/// - Silently does nothing if there is no usable data directory
/// - Idempotent: only the first successful call installs a subscriber
///
/// # Returns
///
/// True if this call installed the subscriber
pub fn init_tracing(config: &Config) -> bool {
    let Some(dir) = data_dir(config.data_dir.as_deref()) else {
        return false;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return false;
    }

    let level = config.trace_level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(RotatingFile::new(log_file(&dir)));

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .is_ok()
}
