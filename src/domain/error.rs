//! Error types for netmodal.
//!
//! This module defines the crate-wide error type [`NetmodalError`] and a type
//! alias [`Result`]. Capture-boundary failures have their own taxonomy in
//! [`crate::capture::CaptureError`] because the reconciler degrades them to
//! status messages instead of propagating them.

use thiserror::Error;

/// The main error type for netmodal operations.
///
/// Most variants wrap underlying errors from external crates using `#[from]`
/// for automatic conversion.
///
/// # Examples
///
/// ```
/// use netmodal::domain::NetmodalError;
///
/// fn validate_config() -> Result<(), NetmodalError> {
///     Err(NetmodalError::Config("bridge command is empty".to_string()))
/// }
/// ```
#[derive(Debug, Error)]
pub enum NetmodalError {
    /// Communication with the capture source failed.
    ///
    /// Raised by the process bridge when the bridge cannot be spawned or its
    /// stdin is gone. The reconciler itself never returns this to callers.
    #[error("Capture error: {0}")]
    Capture(String),

    /// Preference storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Theme parsing failed.
    #[error("Theme error: {0}")]
    Theme(String),

    /// Configuration is invalid or could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A specialized `Result` type for netmodal operations.
pub type Result<T> = std::result::Result<T, NetmodalError>;
