//! Logging to a rotating file.
//!
//! netmodal draws on the whole terminal, so `tracing` output cannot go to
//! stdout or stderr. [`init_tracing`] installs a `tracing-subscriber` fmt
//! layer that writes plain-text lines to `netmodal.log` in the data
//! directory, rotated at 10 MB with 3 backups.
//!
//! Trace level is controlled via:
//! 1. `RUST_LOG` environment variable (highest priority)
//! 2. `trace_level` in the configuration file or `--trace-level`
//! 3. Default: `"info"`
//!
//! # Modules
//!
//! - [`init`]: Subscriber setup
//! - [`file_writer`]: Rotating file writer with size-based rotation

mod file_writer;
mod init;

pub use file_writer::{RotatingFile, MAX_BACKUP_FILES, MAX_FILE_SIZE_BYTES};
pub use init::init_tracing;
