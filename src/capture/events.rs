//! Capture source wire types.
//!
//! Events flow from the source to the reconciler; commands flow back. Both are
//! serialized as one JSON object per line, tagged by `kind` and `op`.

use super::error::WireError;
use crate::domain::{Headers, ResponseBody};
use serde::{Deserialize, Serialize};

/// One message from the capture source.
///
/// Timestamps are seconds on the source's monotonic clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CaptureEvent {
    /// A request was issued.
    Initiated {
        request_id: String,
        timestamp: f64,
        url: String,
        #[serde(default = "default_method")]
        method: String,
        #[serde(default)]
        resource_type: String,
        #[serde(default)]
        request_headers: Headers,
        #[serde(default)]
        request_body: Option<String>,
        #[serde(default)]
        frame_id: Option<String>,
        /// True for top-level document navigations.
        #[serde(default)]
        is_navigation: bool,
    },
    ResponseHeaders {
        request_id: String,
        timestamp: f64,
        status: u16,
        #[serde(default)]
        status_text: String,
        #[serde(default)]
        headers: Headers,
        #[serde(default)]
        mime_type: Option<String>,
    },
    Finished {
        request_id: String,
        timestamp: f64,
        #[serde(default)]
        encoded_data_length: u64,
    },
    Failed {
        request_id: String,
        timestamp: f64,
        error_text: String,
    },
    /// Outcome of an `enable` command; no error means attached.
    AttachResult {
        #[serde(default)]
        error: Option<WireError>,
    },
    /// The source lost its connection to the target.
    Detached {
        #[serde(default)]
        reason: Option<String>,
    },
    /// Outcome of a `getBody` command.
    BodyResult {
        request_id: String,
        #[serde(default)]
        body: Option<ResponseBody>,
        #[serde(default)]
        error: Option<String>,
    },
}

fn default_method() -> String {
    "GET".to_string()
}

impl CaptureEvent {
    /// Request id carried by lifecycle and body events.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Initiated { request_id, .. }
            | Self::ResponseHeaders { request_id, .. }
            | Self::Finished { request_id, .. }
            | Self::Failed { request_id, .. }
            | Self::BodyResult { request_id, .. } => Some(request_id),
            Self::AttachResult { .. } | Self::Detached { .. } => None,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Initiated { .. } => "initiated",
            Self::ResponseHeaders { .. } => "responseHeaders",
            Self::Finished { .. } => "finished",
            Self::Failed { .. } => "failed",
            Self::AttachResult { .. } => "attachResult",
            Self::Detached { .. } => "detached",
            Self::BodyResult { .. } => "bodyResult",
        }
    }
}

/// Command sent to the capture source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BridgeCommand {
    Enable,
    GetBody { request_id: String },
}
