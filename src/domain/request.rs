//! Captured request model.
//!
//! A [`Request`] is one network exchange reported by the capture source. It is
//! created on the "initiated" lifecycle event with placeholder status and size,
//! then replaced copy-on-write by the reconciler as later events arrive. Every
//! replacement bumps [`Request::version`] so views can detect a changed record
//! without comparing fields.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Header map. Ordering carries no meaning; `BTreeMap` keeps display stable.
pub type Headers = BTreeMap<String, String>;

/// Closed set of resource types a request can be classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Xhr,
    Fetch,
    Document,
    Stylesheet,
    Script,
    Image,
    Font,
    Media,
    Manifest,
    Websocket,
    Wasm,
    Other,
}

impl ResourceType {
    /// All resource types in default filter-chip order.
    pub const ALL: [Self; 12] = [
        Self::Xhr,
        Self::Fetch,
        Self::Document,
        Self::Stylesheet,
        Self::Script,
        Self::Image,
        Self::Font,
        Self::Media,
        Self::Manifest,
        Self::Websocket,
        Self::Wasm,
        Self::Other,
    ];

    /// Classifies a capture-source type string.
    ///
    /// Matching is case-insensitive; anything unrecognized is [`ResourceType::Other`].
    ///
    /// ```
    /// use netmodal::domain::ResourceType;
    ///
    /// assert_eq!(ResourceType::parse("XHR"), ResourceType::Xhr);
    /// assert_eq!(ResourceType::parse("WebSocket"), ResourceType::Websocket);
    /// assert_eq!(ResourceType::parse("Ping"), ResourceType::Other);
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "xhr" => Self::Xhr,
            "fetch" => Self::Fetch,
            "document" => Self::Document,
            "stylesheet" => Self::Stylesheet,
            "script" => Self::Script,
            "image" => Self::Image,
            "font" => Self::Font,
            "media" => Self::Media,
            "manifest" => Self::Manifest,
            "websocket" => Self::Websocket,
            "wasm" => Self::Wasm,
            _ => Self::Other,
        }
    }

    /// Short label used on filter chips and in the request table.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Xhr => "xhr",
            Self::Fetch => "fetch",
            Self::Document => "doc",
            Self::Stylesheet => "css",
            Self::Script => "js",
            Self::Image => "img",
            Self::Font => "font",
            Self::Media => "media",
            Self::Manifest => "manifest",
            Self::Websocket => "ws",
            Self::Wasm => "wasm",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A fetched response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    pub text: String,
    #[serde(default)]
    pub base64_encoded: bool,
}

/// One captured network exchange.
///
/// `status` is 0 and `duration` is 0.0 until the matching lifecycle events
/// arrive. `response_body` is populated lazily, the first time a body fetch
/// for this request succeeds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: String,
    pub url: String,
    pub name: String,
    pub method: String,
    pub resource_type: ResourceType,
    pub status: u16,
    pub status_text: String,
    /// Capture-source timestamp of the "initiated" event, in seconds.
    pub timestamp_start: f64,
    /// Milliseconds from initiation to finish/failure.
    pub duration: f64,
    pub transferred_size: u64,
    pub request_headers: Headers,
    pub response_headers: Headers,
    pub request_body: Option<String>,
    pub response_body: Option<Arc<ResponseBody>>,
    pub mime_type: Option<String>,
    pub frame_id: Option<String>,
    pub failed: bool,
    #[serde(skip)]
    pub version: u64,
}

impl Request {
    /// Creates a pending request as seen on the "initiated" event.
    #[must_use]
    pub fn new(id: impl Into<String>, url: impl Into<String>, method: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: id.into(),
            name: derive_name(&url),
            url,
            method: method.into(),
            resource_type: ResourceType::Other,
            status: 0,
            status_text: String::new(),
            timestamp_start: 0.0,
            duration: 0.0,
            transferred_size: 0,
            request_headers: Headers::new(),
            response_headers: Headers::new(),
            request_body: None,
            response_body: None,
            mime_type: None,
            frame_id: None,
            failed: false,
            version: 0,
        }
    }

    /// True until a response, finish or failure has been recorded.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == 0 && !self.failed && self.duration == 0.0
    }

    /// Returns a copy with `f` applied and the version bumped.
    #[must_use]
    pub fn updated(&self, f: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        f(&mut next);
        next.version = self.version.wrapping_add(1);
        next
    }
}

/// Derives the display name of a request from its URL.
///
/// Uses the last non-empty path segment, or the host name when the path is
/// empty. Query and fragment never contribute. Unparsable URLs are returned
/// unchanged.
///
/// ```
/// use netmodal::domain::request::derive_name;
///
/// assert_eq!(derive_name("https://api.example.com/v1/users?page=2"), "users");
/// assert_eq!(derive_name("https://example.com/"), "example.com");
/// assert_eq!(derive_name("not a url"), "not a url");
/// ```
#[must_use]
pub fn derive_name(raw: &str) -> String {
    let Ok(parsed) = url::Url::parse(raw) else {
        return raw.to_string();
    };

    let last_segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .map(str::to_string);

    last_segment
        .or_else(|| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| raw.to_string())
}

/// Formats a byte count the way the request table shows it.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} kB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Formats a duration in milliseconds for display.
#[must_use]
pub fn format_duration(ms: f64) -> String {
    if ms <= 0.0 {
        "-".to_string()
    } else if ms < 1000.0 {
        format!("{ms:.0} ms")
    } else {
        format!("{:.2} s", ms / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_prefers_last_path_segment() {
        assert_eq!(derive_name("https://a.test/api/users/"), "users");
        assert_eq!(derive_name("https://a.test/app.js#frag"), "app.js");
    }

    #[test]
    fn name_falls_back_to_host() {
        assert_eq!(derive_name("https://a.test"), "a.test");
        assert_eq!(derive_name("https://a.test/?q=1"), "a.test");
    }

    #[test]
    fn updated_bumps_version_and_leaves_original() {
        let original = Request::new("1", "https://a.test/x", "GET");
        let next = original.updated(|r| r.status = 404);
        assert_eq!(original.status, 0);
        assert_eq!(next.status, 404);
        assert_eq!(next.version, original.version + 1);
    }

    #[test]
    fn resource_type_parse_is_case_insensitive() {
        assert_eq!(ResourceType::parse("Stylesheet"), ResourceType::Stylesheet);
        assert_eq!(ResourceType::parse("WASM"), ResourceType::Wasm);
        assert_eq!(ResourceType::parse(""), ResourceType::Other);
    }

    #[test]
    fn sizes_and_durations_format() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 kB");
        assert_eq!(format_duration(0.0), "-");
        assert_eq!(format_duration(250.4), "250 ms");
        assert_eq!(format_duration(1500.0), "1.50 s");
    }
}
