//! View model types representing renderable UI state.
//!
//! A [`UIViewModel`] is computed from the committed [`AppState`], the request
//! list's recycled slots and the layout, then handed to the renderer. It
//! contains no business logic, only display-ready data.

use crate::app::modes::{CopyTarget, Mode, Pane};
use crate::store::{AppState, CaptureStatus, PreviewDocument, StatusMessage};
use crate::ui::helpers::find_ranges;
use crate::ui::panels::{
    header_rows, node_line, pane_lines, previewed_request, response_lines, search_matches, HeaderRow, ListRow,
    RequestList,
};
use std::ops::Range;

/// Complete UI view model for rendering.
#[derive(Debug, Clone)]
pub struct UIViewModel {
    pub header: HeaderInfo,
    /// Request search box (SEARCH mode, or a query is active).
    pub search_bar: Option<SearchBarInfo>,
    /// Filter chips (FILTER mode, or a filter is active).
    pub chips: Option<Vec<ChipInfo>>,
    /// `None` when INSPECT runs full width.
    pub list: Option<ListView>,
    pub detail: DetailView,
    pub copy_menu: Option<CopyMenu>,
    pub status: Option<StatusMessage>,
    pub footer: FooterInfo,
}

#[derive(Debug, Clone)]
pub struct HeaderInfo {
    pub title: String,
    pub mode: Mode,
    pub shown: usize,
    pub total: usize,
    pub capture: CaptureStatus,
    /// Sequence prefix waiting for its second key.
    pub pending_prefix: Option<char>,
}

#[derive(Debug, Clone)]
pub struct SearchBarInfo {
    pub query: String,
    /// Whether the box has input focus.
    pub editing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipInfo {
    pub label: &'static str,
    pub active: bool,
    pub under_cursor: bool,
}

#[derive(Debug, Clone)]
pub struct ListView {
    pub rows: Vec<DisplayRow>,
    /// Shown when the filtered view is empty.
    pub empty_state: Option<EmptyState>,
}

/// One request list row placed in the viewport.
#[derive(Debug, Clone)]
pub struct DisplayRow {
    /// Index in the filtered view.
    pub index: usize,
    pub row: ListRow,
    pub is_selected: bool,
}

#[derive(Debug, Clone)]
pub struct EmptyState {
    pub message: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Header section title.
    Heading,
    /// `name: value` pair; `name_len` is the name length in characters.
    Field { name_len: usize },
    Plain,
}

#[derive(Debug, Clone)]
pub struct DetailLine {
    pub text: String,
    pub kind: LineKind,
    pub is_cursor: bool,
    /// In-pane search match ranges (character indices).
    pub matches: Vec<(usize, usize)>,
}

#[derive(Debug, Clone)]
pub struct DetailView {
    pub tabs: Vec<(Pane, bool)>,
    /// True in INSPECT (the pane has keyboard focus).
    pub focused: bool,
    pub lines: Vec<DetailLine>,
    /// Replaces `lines` when there is nothing to show.
    pub placeholder: Option<String>,
    /// `/query` prompt shown under the tabs during panel search.
    pub search_prompt: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CopyMenu {
    /// Hotkey, label, highlighted.
    pub entries: Vec<(char, &'static str, bool)>,
}

#[derive(Debug, Clone)]
pub struct FooterInfo {
    pub keybindings: String,
}

fn keybindings(state: &AppState) -> &'static str {
    match state.mode {
        Mode::Normal => "j/k: move | gg/G: top/bottom | /: search | f: filter | Enter: inspect | c: copy | dd/dr: delete/clear | R: retry | q: quit",
        Mode::Search => "type to search (q is text) | Backspace: delete | Enter: back, keep query | Esc: back, clear",
        Mode::Filter => "h/l: move | Space: toggle | H/L: reorder | a: all | q: back",
        Mode::Copy => "j/k: move | Enter: copy | u r h H c J: copy directly | q: back",
        Mode::Inspect => match state.inspect.focus {
            Pane::Headers => "j/k: move | Space: fold | y/yp: copy value/line | Tab: pane | /: find | w: wide | q: back",
            Pane::Response => "j/k: scroll | ^d/^u: page | y: copy body | Tab: pane | /: find | w: wide | q: back",
            Pane::Preview => "j/k: move | l/h: open/close | Space: toggle | y/yp: copy value/path | Tab: pane | /: find | q: back",
        },
    }
}

fn placeholder(state: &AppState, pane: Pane) -> Option<String> {
    let Some(request) = previewed_request(state) else {
        return Some("No request selected".to_string());
    };
    if pane == Pane::Headers {
        return None;
    }
    if request.failed {
        return Some(format!("Request failed: {}", request.status_text));
    }
    if request.is_pending() {
        return Some("Waiting for response...".to_string());
    }
    match (&state.preview, &request.response_body) {
        (_, None) => Some("Loading response body...".to_string()),
        (PreviewDocument::Raw(text), _) if text.is_empty() => Some("(empty body)".to_string()),
        _ => None,
    }
}

fn pane_detail_lines(state: &AppState, pane: Pane) -> Vec<(String, LineKind)> {
    match pane {
        Pane::Headers => previewed_request(state)
            .map(|request| {
                header_rows(request, &state.collapsed_sections)
                    .into_iter()
                    .map(|row| match row {
                        HeaderRow::Section { section, collapsed, count } => {
                            let marker = if collapsed { '▸' } else { '▾' };
                            (format!("{marker} {} ({count})", section.title()), LineKind::Heading)
                        }
                        HeaderRow::Field { name, value, .. } => {
                            let name_len = name.chars().count() + 2;
                            (format!("  {name}: {value}"), LineKind::Field { name_len })
                        }
                    })
                    .collect()
            })
            .unwrap_or_default(),
        Pane::Response => response_lines(state)
            .into_iter()
            .map(|line| (line, LineKind::Plain))
            .collect(),
        Pane::Preview => match &state.preview {
            PreviewDocument::Json(_) => state
                .json_nodes
                .iter()
                .map(|node| {
                    let line = node_line(node);
                    let kind = if node.key.is_empty() {
                        LineKind::Plain
                    } else {
                        LineKind::Field {
                            name_len: 2 * node.depth + 2 + node.key.chars().count(),
                        }
                    };
                    (line, kind)
                })
                .collect(),
            PreviewDocument::Raw(text) => text.lines().map(|l| (l.to_string(), LineKind::Plain)).collect(),
            PreviewDocument::Empty => Vec::new(),
        },
    }
}

fn detail_view(state: &AppState, height: usize) -> DetailView {
    let inspecting = state.mode == Mode::Inspect;
    let pane = if inspecting { state.inspect.focus } else { state.preview_tab };
    let tabs = Pane::ALL.iter().map(|&p| (p, p == pane)).collect();

    let placeholder = placeholder(state, pane);
    let search = state.inspect.search.as_ref().filter(|_| inspecting);
    let search_prompt = search.map(|s| {
        if s.editing {
            format!("/{}", s.query)
        } else {
            format!("/{}  [{} matches]", s.query, match_count(state, pane))
        }
    });

    let mut lines = Vec::new();
    if placeholder.is_none() {
        let all = pane_detail_lines(state, pane);
        let cursor = state.panels.get(pane);
        let query = search.map(|s| s.query.as_str()).unwrap_or_default();
        let height = height.saturating_sub(usize::from(search_prompt.is_some()));
        let window: Range<usize> = cursor.scroll.min(all.len())..(cursor.scroll + height).min(all.len());
        lines = all[window.clone()]
            .iter()
            .zip(window)
            .map(|((text, kind), index)| DetailLine {
                matches: find_ranges(text, query),
                text: text.clone(),
                kind: *kind,
                is_cursor: inspecting && pane != Pane::Response && index == cursor.selected,
            })
            .collect();
    }

    DetailView {
        tabs,
        focused: inspecting,
        lines,
        placeholder,
        search_prompt,
    }
}

fn match_count(state: &AppState, pane: Pane) -> usize {
    state
        .inspect
        .search
        .as_ref()
        .map_or(0, |search| search_matches(&pane_lines(pane, state), &search.query).len())
}

/// Inputs of [`compute_viewmodel`] that do not live in [`AppState`].
#[derive(Debug, Clone, Copy)]
pub struct ViewContext {
    pub shown: usize,
    pub detail_height: usize,
    pub pending_prefix: Option<char>,
}

/// Builds the view model for one frame.
///
/// # Parameters
///
/// * `state` - Committed application state
/// * `list` - Request list whose slots were reconciled for this frame
/// * `cx` - Filtered view length, detail pane height and sequence prefix
#[must_use]
pub fn compute_viewmodel(state: &AppState, list: &RequestList, cx: ViewContext) -> UIViewModel {
    let header = HeaderInfo {
        title: "netmodal".to_string(),
        mode: state.mode,
        shown: cx.shown,
        total: state.requests.len(),
        capture: state.capture,
        pending_prefix: cx.pending_prefix,
    };

    let search_bar = (state.mode == Mode::Search || !state.search_query.is_empty()).then(|| SearchBarInfo {
        query: state.search_query.clone(),
        editing: state.mode == Mode::Search,
    });

    let chips = (state.mode == Mode::Filter || !state.filter.selected.is_empty()).then(|| {
        state
            .filter
            .order
            .iter()
            .enumerate()
            .map(|(i, kind)| ChipInfo {
                label: kind.label(),
                active: state.filter.selected.contains(kind),
                under_cursor: state.mode == Mode::Filter && i == state.filter_cursor,
            })
            .collect()
    });

    let full_width = state.mode == Mode::Inspect && state.inspect.full_width;
    let list = (!full_width).then(|| {
        let rows: Vec<DisplayRow> = list
            .viewport_rows()
            .into_iter()
            .map(|(index, row)| DisplayRow {
                index,
                row: row.clone(),
                is_selected: index == state.selected_index,
            })
            .collect();
        let empty_state = (cx.shown == 0).then(|| {
            if state.requests.is_empty() {
                EmptyState {
                    message: "No requests captured yet".to_string(),
                    subtitle: "Requests appear here as the page loads".to_string(),
                }
            } else {
                EmptyState {
                    message: "No matching requests".to_string(),
                    subtitle: "Esc clears the search, f changes filters".to_string(),
                }
            }
        });
        ListView { rows, empty_state }
    });

    let copy_menu = (state.mode == Mode::Copy).then(|| CopyMenu {
        entries: CopyTarget::MENU
            .iter()
            .enumerate()
            .map(|(i, (key, target))| (*key, target.label(), i == state.copy_cursor))
            .collect(),
    });

    UIViewModel {
        header,
        search_bar,
        chips,
        list,
        detail: detail_view(state, cx.detail_height),
        copy_menu,
        status: state.status.clone(),
        footer: FooterInfo {
            keybindings: keybindings(state).to_string(),
        },
    }
}
