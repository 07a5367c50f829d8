//! Mode and focus state types.
//!
//! Exactly one [`Mode`] is active at a time. Inside INSPECT, an orthogonal
//! [`Pane`] focus picks which sub-navigation rules apply; the same three panes
//! double as the preview tabs shown next to the request list in NORMAL mode.
//!
//! # State Machine
//!
//! ```text
//!            "/"            "f"            Enter           "c"
//!   Search <----- Normal -----> Filter   Normal ---> Inspect   Normal ---> Copy
//!   Enter/Esc --> Normal   q/Esc --> Normal   q --> Normal   q/Esc/copy --> Normal
//! ```

use serde::{Deserialize, Serialize};

/// Top-level interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Mode {
    /// Request list navigation and global commands.
    #[default]
    Normal,
    /// Editing the fuzzy search query over the request list.
    Search,
    /// Toggling and reordering resource-type filter chips.
    Filter,
    /// Navigating the detail panes of the selected request.
    Inspect,
    /// Choosing what to copy from the selected request.
    Copy,
}

impl Mode {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Search => "SEARCH",
            Self::Filter => "FILTER",
            Self::Inspect => "INSPECT",
            Self::Copy => "COPY",
        }
    }
}

/// Detail pane, used both as INSPECT focus and as the NORMAL preview tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum Pane {
    /// Sectioned header list (list navigation).
    #[default]
    Headers,
    /// Raw response text (line scrolling).
    Response,
    /// JSON tree of the response body (tree navigation).
    Preview,
}

impl Pane {
    pub const ALL: [Self; 3] = [Self::Headers, Self::Response, Self::Preview];

    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Headers => Self::Response,
            Self::Response => Self::Preview,
            Self::Preview => Self::Headers,
        }
    }

    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::Headers => Self::Preview,
            Self::Response => Self::Headers,
            Self::Preview => Self::Response,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Headers => "Headers",
            Self::Response => "Response",
            Self::Preview => "Preview",
        }
    }
}

/// Collapsible section of the headers pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    General,
    RequestHeaders,
    ResponseHeaders,
}

impl Section {
    pub const ALL: [Self; 3] = [Self::General, Self::RequestHeaders, Self::ResponseHeaders];

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::RequestHeaders => "Request Headers",
            Self::ResponseHeaders => "Response Headers",
        }
    }
}

/// Something the COPY menu (or a yank) can put on the clipboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CopyTarget {
    Url,
    ResponseBody,
    RequestHeaders,
    ResponseHeaders,
    Curl,
    Json,
    /// A single header line from the headers pane.
    HeaderValue { name: String, value: String, with_name: bool },
    /// The raw value of a JSON preview node.
    NodeValue { pointer: String },
    /// The dot/bracket path of a JSON preview node.
    NodePath { path: String },
}

impl CopyTarget {
    /// Entries of the COPY menu in display order, with their hotkeys.
    pub const MENU: [(char, Self); 6] = [
        ('u', Self::Url),
        ('r', Self::ResponseBody),
        ('h', Self::RequestHeaders),
        ('H', Self::ResponseHeaders),
        ('c', Self::Curl),
        ('J', Self::Json),
    ];

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Url => "URL",
            Self::ResponseBody => "Response body",
            Self::RequestHeaders => "Request headers",
            Self::ResponseHeaders => "Response headers",
            Self::Curl => "cURL command",
            Self::Json => "Request as JSON",
            Self::HeaderValue { .. } => "Header",
            Self::NodeValue { .. } => "Value",
            Self::NodePath { .. } => "Path",
        }
    }

    /// Whether formatting this target needs the response body.
    #[must_use]
    pub const fn needs_body(&self) -> bool {
        matches!(self, Self::ResponseBody | Self::Json | Self::NodeValue { .. })
    }
}
