//! Panel components and their navigation methods.
//!
//! The interpreter never edits cursors or expansion state directly; it calls
//! the methods here, which read the store's settled state and write back
//! through [`StatePatch`]es. Row builders in this module are shared with the
//! renderer so that what is searched is exactly what is drawn.

mod headers;
mod request_list;

pub use headers::{header_rows, HeaderRow};
pub use request_list::{ListRow, RequestList};

use crate::app::copy::body_text;
use crate::app::modes::Pane;
use crate::domain::Request;
use crate::store::{AppState, PanelCursor, PanelSearch, PreviewDocument, StatePatch, Store};
use crate::tree::{parent_path, JsonNode};
use crate::ui::virtual_list::scroll_into_view;
use std::sync::Arc;

/// Target of a jump to the first or last row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    First,
    Last,
}

/// The request whose details the panes show.
#[must_use]
pub fn previewed_request(state: &AppState) -> Option<&Arc<Request>> {
    let id = state.preview_request.as_deref()?;
    state.requests.iter().find(|r| r.id == id)
}

/// Display text of one JSON tree row.
#[must_use]
pub fn node_line(node: &JsonNode) -> String {
    let marker = if node.kind.is_container() {
        if node.expanded {
            "▾ "
        } else {
            "▸ "
        }
    } else {
        "  "
    };
    let indent = "  ".repeat(node.depth);
    if node.key.is_empty() {
        format!("{indent}{marker}{}", node.preview)
    } else {
        format!("{indent}{marker}{}: {}", node.key, node.preview)
    }
}

/// Lines of the response pane: the body as text, pretty-printed when JSON.
#[must_use]
pub fn response_lines(state: &AppState) -> Vec<String> {
    let Some(request) = previewed_request(state) else {
        return Vec::new();
    };
    match (&state.preview, &request.response_body) {
        (PreviewDocument::Json(value), _) => serde_json::to_string_pretty(value.as_ref())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect(),
        (PreviewDocument::Raw(text), _) => text.lines().map(str::to_string).collect(),
        (PreviewDocument::Empty, Some(body)) => body_text(body).lines().map(str::to_string).collect(),
        (PreviewDocument::Empty, None) => Vec::new(),
    }
}

/// Plain-text rows of `pane`, as drawn and as searched.
#[must_use]
pub fn pane_lines(pane: Pane, state: &AppState) -> Vec<String> {
    match pane {
        Pane::Headers => previewed_request(state)
            .map(|request| {
                header_rows(request, &state.collapsed_sections)
                    .iter()
                    .map(HeaderRow::text)
                    .collect()
            })
            .unwrap_or_default(),
        Pane::Response => response_lines(state),
        Pane::Preview => match &state.preview {
            PreviewDocument::Json(_) => state.json_nodes.iter().map(node_line).collect(),
            PreviewDocument::Raw(text) => text.lines().map(str::to_string).collect(),
            PreviewDocument::Empty => Vec::new(),
        },
    }
}

/// Indices of lines containing `query`, case-insensitively.
#[must_use]
pub fn search_matches(lines: &[String], query: &str) -> Vec<usize> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.to_lowercase().contains(&needle))
        .map(|(index, _)| index)
        .collect()
}

/// Navigation over the detail panes.
#[derive(Debug)]
pub struct Panels {
    pub list: RequestList,
    detail_height: usize,
}

impl Panels {
    #[must_use]
    pub fn new(buffer_rows: usize) -> Self {
        Self {
            list: RequestList::new(buffer_rows),
            detail_height: 10,
        }
    }

    /// Records the visible heights computed by the last layout.
    pub fn set_layout(&mut self, list_height: usize, detail_height: usize) {
        self.list.virtual_list_mut().set_viewport_height(list_height);
        self.detail_height = detail_height.max(1);
    }

    #[must_use]
    pub const fn detail_height(&self) -> usize {
        self.detail_height
    }

    fn rows(&self, store: &mut Store, pane: Pane) -> usize {
        pane_lines(pane, store.settled()).len()
    }

    /// Puts the cursor of `pane` on `index` and scrolls it into view.
    fn set_cursor(&self, store: &mut Store, pane: Pane, index: usize) {
        let len = self.rows(store, pane);
        let mut panels = store.settled().panels;
        let cursor = panels.get_mut(pane);
        let index = index.min(len.saturating_sub(1));
        *cursor = match pane {
            Pane::Response => {
                let top = index.min(len.saturating_sub(self.detail_height));
                PanelCursor {
                    selected: index,
                    scroll: top,
                }
            }
            Pane::Headers | Pane::Preview => PanelCursor {
                selected: index,
                scroll: scroll_into_view(cursor.scroll, self.detail_height, index, 1),
            },
        };
        store.set_state(StatePatch {
            panels: Some(panels),
            ..StatePatch::default()
        });
    }

    pub fn move_cursor(&self, store: &mut Store, pane: Pane, delta: isize) {
        let current = store.settled().panels.get(pane);
        let from = match pane {
            Pane::Response => current.scroll,
            Pane::Headers | Pane::Preview => current.selected,
        };
        self.set_cursor(store, pane, from.saturating_add_signed(delta));
    }

    pub fn navigate_to(&self, store: &mut Store, pane: Pane, edge: Edge) {
        let index = match edge {
            Edge::First => 0,
            Edge::Last => self.rows(store, pane).saturating_sub(1),
        };
        self.set_cursor(store, pane, index);
    }

    /// Half a pane down (`direction > 0`) or up.
    pub fn page(&self, store: &mut Store, pane: Pane, direction: isize) {
        let half = isize::try_from((self.detail_height / 2).max(1)).unwrap_or(1);
        self.move_cursor(store, pane, half.saturating_mul(direction.signum()));
    }

    /// Collapses or expands the header section containing the cursor.
    pub fn toggle_section(&self, store: &mut Store) {
        let state = store.settled();
        let Some(request) = previewed_request(state).cloned() else {
            return;
        };
        let rows = header_rows(&request, &state.collapsed_sections);
        let Some(row) = rows.get(state.panels.headers.selected) else {
            return;
        };
        let section = row.section();
        let mut collapsed = state.collapsed_sections.clone();
        if !collapsed.remove(&section) {
            collapsed.insert(section);
        }
        tracing::debug!(?section, collapsed = collapsed.contains(&section), "toggle section");

        let header_index = header_rows(&request, &collapsed)
            .iter()
            .position(|r| matches!(r, HeaderRow::Section { section: s, .. } if *s == section))
            .unwrap_or(0);
        store.set_state(StatePatch {
            collapsed_sections: Some(collapsed),
            ..StatePatch::default()
        });
        self.set_cursor(store, Pane::Headers, header_index);
    }

    fn node_at_cursor(store: &mut Store) -> Option<JsonNode> {
        let state = store.settled();
        if !matches!(state.preview, PreviewDocument::Json(_)) {
            return None;
        }
        state.json_nodes.get(state.panels.preview.selected).cloned()
    }

    fn set_expanded(store: &mut Store, path: &str, expanded: bool) {
        let mut expansion = store.settled().expansion.clone();
        if expansion.set(path, expanded) {
            tracing::debug!(path, expanded, "expansion changed");
            store.set_state(StatePatch {
                expansion: Some(expansion),
                ..StatePatch::default()
            });
        }
    }

    pub fn expand_node(&self, store: &mut Store) {
        if let Some(node) = Self::node_at_cursor(store) {
            if node.kind.is_container() {
                Self::set_expanded(store, &node.path, true);
            }
        }
    }

    /// Collapses an expanded container; on a leaf or an already collapsed
    /// node, moves to the structural parent instead.
    pub fn collapse_node(&self, store: &mut Store) {
        let Some(node) = Self::node_at_cursor(store) else {
            return;
        };
        if node.kind.is_container() && node.expanded {
            Self::set_expanded(store, &node.path, false);
            return;
        }
        let Some(parent) = parent_path(&node.path) else {
            return;
        };
        let index = store.settled().json_nodes.iter().position(|n| n.path == parent);
        if let Some(index) = index {
            self.set_cursor(store, Pane::Preview, index);
        }
    }

    pub fn toggle_node(&self, store: &mut Store) {
        if let Some(node) = Self::node_at_cursor(store) {
            if node.kind.is_container() {
                Self::set_expanded(store, &node.path, !node.expanded);
            }
        }
    }

    /// Moves to the next (or previous) search match, wrapping around.
    pub fn search_step(&self, store: &mut Store, pane: Pane, forward: bool) {
        let state = store.settled();
        let Some(mut search) = state.inspect.search.clone() else {
            return;
        };
        let matches = search_matches(&pane_lines(pane, state), &search.query);
        if matches.is_empty() {
            return;
        }
        let len = matches.len();
        search.current = if forward {
            (search.current + 1) % len
        } else {
            (search.current + len - 1) % len
        };
        let target = matches[search.current];
        self.apply_search(store, pane, search, target);
    }

    /// Jumps to the first match at or after the cursor once a query is
    /// entered.
    pub fn search_commit(&self, store: &mut Store, pane: Pane) {
        let state = store.settled();
        let Some(mut search) = state.inspect.search.clone() else {
            return;
        };
        search.editing = false;
        let cursor = state.panels.get(pane).selected;
        let matches = search_matches(&pane_lines(pane, state), &search.query);
        let current = matches.iter().position(|&m| m >= cursor).unwrap_or(0);
        match matches.get(current) {
            Some(&target) => {
                search.current = current;
                self.apply_search(store, pane, search, target);
            }
            None => Self::apply_search_state(store, search),
        }
    }

    fn apply_search(&self, store: &mut Store, pane: Pane, search: PanelSearch, target: usize) {
        Self::apply_search_state(store, search);
        self.set_cursor(store, pane, target);
    }

    fn apply_search_state(store: &mut Store, search: PanelSearch) {
        let mut inspect = store.settled().inspect.clone();
        inspect.search = Some(search);
        store.set_state(StatePatch {
            inspect: Some(inspect),
            ..StatePatch::default()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResponseBody;

    fn store_with_body(text: &str) -> Store {
        let mut store = Store::default();
        let mut request = Request::new("1", "https://a.test/x", "GET");
        request.response_body = Some(Arc::new(ResponseBody {
            text: text.into(),
            base64_encoded: false,
        }));
        store.upsert_request(request);
        store.flush();
        store
    }

    #[test]
    fn collapse_on_leaf_moves_to_parent() {
        let mut store = store_with_body(r#"{"data":{"users":[{"name":"a"}]}}"#);
        let panels = Panels::new(5);
        // rows: data, users, [0], name
        panels.navigate_to(&mut store, Pane::Preview, Edge::Last);
        assert_eq!(store.settled().panels.preview.selected, 3);

        panels.collapse_node(&mut store);
        assert_eq!(store.settled().panels.preview.selected, 2);

        panels.collapse_node(&mut store);
        assert_eq!(store.settled().json_nodes.len(), 3);

        panels.collapse_node(&mut store);
        assert_eq!(store.settled().panels.preview.selected, 1);
        store.flush();
        assert_eq!(store.get_state().panels.preview.selected, 1);
    }

    #[test]
    fn expand_restores_children_in_order() {
        let mut store = store_with_body(r#"{"a":[1,2],"b":true}"#);
        let panels = Panels::new(5);
        panels.toggle_node(&mut store);
        let collapsed: Vec<String> = store.settled().json_nodes.iter().map(|n| n.path.clone()).collect();
        assert_eq!(collapsed, ["a", "b"]);
        panels.expand_node(&mut store);
        let expanded: Vec<String> = store.settled().json_nodes.iter().map(|n| n.path.clone()).collect();
        assert_eq!(expanded, ["a", "a[0]", "a[1]", "b"]);
    }

    #[test]
    fn search_wraps_both_ways() {
        let mut store = store_with_body(r#"{"x":"hit","y":"miss","z":"hit"}"#);
        let panels = Panels::new(5);
        let mut inspect = store.settled().inspect.clone();
        inspect.search = Some(PanelSearch {
            query: "HIT".into(),
            editing: true,
            current: 0,
        });
        store.set_state(StatePatch {
            inspect: Some(inspect),
            ..StatePatch::default()
        });

        panels.search_commit(&mut store, Pane::Preview);
        assert_eq!(store.settled().panels.preview.selected, 0);
        panels.search_step(&mut store, Pane::Preview, true);
        assert_eq!(store.settled().panels.preview.selected, 2);
        panels.search_step(&mut store, Pane::Preview, true);
        assert_eq!(store.settled().panels.preview.selected, 0);
        panels.search_step(&mut store, Pane::Preview, false);
        assert_eq!(store.settled().panels.preview.selected, 2);
    }

    #[test]
    fn toggle_section_keeps_cursor_on_header() {
        let mut store = store_with_body("{}");
        let panels = Panels::new(5);
        panels.set_cursor(&mut store, Pane::Headers, 2);
        panels.toggle_section(&mut store);
        let state = store.settled();
        assert!(state.collapsed_sections.contains(&crate::app::modes::Section::General));
        assert_eq!(state.panels.headers.selected, 0);
    }
}
