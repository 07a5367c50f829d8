//! Application state snapshot and partial updates.
//!
//! [`AppState`] is the single authoritative state. The [`Store`](super::Store)
//! owns it; everybody else sees immutable `Arc<AppState>` snapshots and
//! requests changes through [`StatePatch`] or the store's request methods.

use crate::app::modes::{Mode, Pane, Section};
use crate::domain::{Request, ResourceType};
use crate::tree::{ExpansionMap, JsonNode};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Maximum number of live requests; the oldest are evicted first.
pub const MAX_REQUESTS: usize = 1000;

/// Severity class of a status line message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Persists until resolved or replaced by another error.
    Error,
    Info,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub id: u64,
    pub class: StatusClass,
    pub text: String,
}

/// Attachment state of the capture source as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureStatus {
    #[default]
    Inactive,
    Attaching { attempt: u32 },
    Active,
    Failed,
}

/// Resource-type filter selection plus user-defined chip order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    /// Empty means "show all".
    pub selected: BTreeSet<ResourceType>,
    pub order: Vec<ResourceType>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            selected: BTreeSet::new(),
            order: ResourceType::ALL.to_vec(),
        }
    }
}

impl FilterState {
    #[must_use]
    pub fn admits(&self, resource_type: ResourceType) -> bool {
        self.selected.is_empty() || self.selected.contains(&resource_type)
    }
}

/// Selection and scroll position of one detail pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelCursor {
    pub selected: usize,
    pub scroll: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelCursors {
    pub headers: PanelCursor,
    pub response: PanelCursor,
    pub preview: PanelCursor,
}

impl PanelCursors {
    #[must_use]
    pub const fn get(&self, pane: Pane) -> PanelCursor {
        match pane {
            Pane::Headers => self.headers,
            Pane::Response => self.response,
            Pane::Preview => self.preview,
        }
    }

    pub fn get_mut(&mut self, pane: Pane) -> &mut PanelCursor {
        match pane {
            Pane::Headers => &mut self.headers,
            Pane::Response => &mut self.response,
            Pane::Preview => &mut self.preview,
        }
    }
}

/// In-pane text search inside INSPECT.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelSearch {
    pub query: String,
    /// True while the query is still being typed.
    pub editing: bool,
    /// Index into the pane's current match list.
    pub current: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InspectState {
    pub focus: Pane,
    pub full_width: bool,
    pub search: Option<PanelSearch>,
}

/// Parsed form of the previewed request's response body.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PreviewDocument {
    /// No request selected, or its body has not been fetched.
    #[default]
    Empty,
    Json(Arc<Value>),
    /// Body that is not valid JSON, kept verbatim.
    Raw(Arc<str>),
}

/// The complete application state.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub mode: Mode,
    /// Live requests in insertion order.
    pub requests: Arc<Vec<Arc<Request>>>,
    /// Bumped on every change to `requests`.
    pub requests_revision: u64,
    /// Bumped when membership or searchable text (url/name) changes.
    pub index_revision: u64,
    /// Index into the filtered view.
    pub selected_index: usize,
    pub search_query: String,
    pub filter: FilterState,
    /// Chip under the cursor in FILTER mode (index into `filter.order`).
    pub filter_cursor: usize,
    /// Highlighted COPY menu entry.
    pub copy_cursor: usize,
    /// Detail tab shown next to the list in NORMAL mode.
    pub preview_tab: Pane,
    pub inspect: InspectState,
    pub panels: PanelCursors,
    pub collapsed_sections: BTreeSet<Section>,
    pub expansion: ExpansionMap,
    /// Id of the request the detail panes currently describe.
    pub preview_request: Option<String>,
    pub preview: PreviewDocument,
    /// Flattened JSON rows, consistent with `preview` and `expansion`.
    pub json_nodes: Arc<Vec<JsonNode>>,
    pub status: Option<StatusMessage>,
    pub capture: CaptureStatus,
}

/// Partial update merged into the working state by [`Store::set_state`](super::Store::set_state).
///
/// Every `Some` field overwrites the current value; within one tick the last
/// write to a field wins.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub mode: Option<Mode>,
    pub selected_index: Option<usize>,
    pub search_query: Option<String>,
    pub filter: Option<FilterState>,
    pub filter_cursor: Option<usize>,
    pub copy_cursor: Option<usize>,
    pub preview_tab: Option<Pane>,
    pub inspect: Option<InspectState>,
    pub panels: Option<PanelCursors>,
    pub collapsed_sections: Option<BTreeSet<Section>>,
    pub expansion: Option<ExpansionMap>,
    pub status: Option<Option<StatusMessage>>,
    pub capture: Option<CaptureStatus>,
}

impl StatePatch {
    pub(crate) fn apply(self, state: &mut AppState) {
        if let Some(mode) = self.mode {
            state.mode = mode;
        }
        if let Some(index) = self.selected_index {
            state.selected_index = index;
        }
        if let Some(query) = self.search_query {
            state.search_query = query;
        }
        if let Some(filter) = self.filter {
            state.filter = filter;
        }
        if let Some(cursor) = self.filter_cursor {
            state.filter_cursor = cursor;
        }
        if let Some(cursor) = self.copy_cursor {
            state.copy_cursor = cursor;
        }
        if let Some(tab) = self.preview_tab {
            state.preview_tab = tab;
        }
        if let Some(inspect) = self.inspect {
            state.inspect = inspect;
        }
        if let Some(panels) = self.panels {
            state.panels = panels;
        }
        if let Some(sections) = self.collapsed_sections {
            state.collapsed_sections = sections;
        }
        if let Some(expansion) = self.expansion {
            state.expansion = expansion;
        }
        if let Some(status) = self.status {
            state.status = status;
        }
        if let Some(capture) = self.capture {
            state.capture = capture;
        }
    }
}
