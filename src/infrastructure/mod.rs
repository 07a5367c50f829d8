//! Infrastructure layer for filesystem and environment interactions.
//!
//! Resolves where netmodal keeps its configuration, preferences and log file.

pub mod paths;

pub use paths::{config_dir, config_file, data_dir, expand_tilde, log_file, preferences_file};
