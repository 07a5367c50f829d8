use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a capture source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Attachment failed for a reason that may go away (busy, timing).
    #[error("transient capture failure: {0}")]
    Transient(String),

    /// The source was already attached; treated as success.
    #[error("capture already active")]
    AlreadyActive,

    /// Another consumer holds exclusive access to the capture target.
    #[error("another debugger is attached to this target")]
    ExclusiveConflict,

    /// The target kind cannot be captured at all.
    #[error("capture is not supported for this target: {0}")]
    UnsupportedTarget(String),

    #[error("capture failed: {0}")]
    Permanent(String),

    /// The channel to the source is gone.
    #[error("capture source disconnected")]
    Disconnected,
}

impl CaptureError {
    /// Whether an attach attempt failing with this error may be retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Disconnected)
    }

    /// Text shown to the user when this error ends an attach cycle.
    #[must_use]
    pub fn guidance(&self) -> String {
        match self {
            Self::ExclusiveConflict => {
                "Capture blocked: another debugger is attached. Close it and press R to retry".to_string()
            }
            Self::UnsupportedTarget(reason) => {
                format!("Cannot capture this target ({reason}). Open a regular web page instead")
            }
            other => other.to_string(),
        }
    }
}

/// Error codes carried by the bridge's `attachResult` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    Transient,
    AlreadyActive,
    ExclusiveConflict,
    UnsupportedTarget,
    Permanent,
}

/// Wire form of an attach failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    pub code: ErrorCode,
    #[serde(default)]
    pub message: String,
}

impl From<WireError> for CaptureError {
    fn from(wire: WireError) -> Self {
        match wire.code {
            ErrorCode::Transient => Self::Transient(wire.message),
            ErrorCode::AlreadyActive => Self::AlreadyActive,
            ErrorCode::ExclusiveConflict => Self::ExclusiveConflict,
            ErrorCode::UnsupportedTarget => Self::UnsupportedTarget(wire.message),
            ErrorCode::Permanent => Self::Permanent(wire.message),
        }
    }
}

impl From<CaptureError> for crate::domain::NetmodalError {
    fn from(err: CaptureError) -> Self {
        Self::Capture(err.to_string())
    }
}
