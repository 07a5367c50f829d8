//! Modal key interpretation.
//!
//! [`Interpreter::handle_key`] maps a key, the current mode and the pending
//! sequence prefix onto store updates and host [`Action`]s. All collaborators
//! arrive through [`Context`], so tests can drive the interpreter with an
//! in-memory store and a scripted capture source.

use super::actions::Action;
use super::copy::{copy_action, CopyFormatter};
use super::keys::{BareKey, Key};
use super::modes::{CopyTarget, Mode, Pane};
use super::scheduler::Scheduler;
use super::sequence::{Feed, Sequence, SequenceBuffer};
use crate::capture::{BodyFetch, Reconciler};
use crate::domain::ResponseBody;
use crate::store::{InspectState, PanelSearch, PreviewDocument, StatePatch, StatusClass, Store};
use crate::ui::panels::{header_rows, Edge, HeaderRow, Panels};
use std::sync::Arc;

/// Identifies who is waiting for a response body fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyWaiter {
    /// The detail panes of the previewed request.
    Preview,
    /// A copy command that needs the body to be formatted.
    Copy { request_id: String, target: CopyTarget },
}

/// Everything a key handler may touch.
pub struct Context<'a> {
    pub store: &'a mut Store,
    pub scheduler: &'a mut Scheduler,
    pub reconciler: &'a mut Reconciler<BodyWaiter>,
    pub panels: &'a mut Panels,
    pub formatter: &'a dyn CopyFormatter,
}

const NORMAL_SEQUENCES: &[Sequence] = &[
    Sequence::First,
    Sequence::DeleteSelected,
    Sequence::ClearAll,
    Sequence::YankValue,
];
const HEADERS_SEQUENCES: &[Sequence] = &[Sequence::First, Sequence::YankValue, Sequence::YankPath];
const RESPONSE_SEQUENCES: &[Sequence] = &[Sequence::First, Sequence::YankValue];
const PREVIEW_SEQUENCES: &[Sequence] = &[Sequence::First, Sequence::YankValue, Sequence::YankPath];

/// Sequences recognized in `mode` with INSPECT focus `focus`.
///
/// Text-entry states (SEARCH, a panel search being typed) recognize none.
#[must_use]
pub const fn allowed_sequences(mode: Mode, focus: Pane, typing: bool) -> &'static [Sequence] {
    match mode {
        Mode::Normal => NORMAL_SEQUENCES,
        Mode::Inspect if !typing => match focus {
            Pane::Headers => HEADERS_SEQUENCES,
            Pane::Response => RESPONSE_SEQUENCES,
            Pane::Preview => PREVIEW_SEQUENCES,
        },
        Mode::Inspect | Mode::Search | Mode::Filter | Mode::Copy => &[],
    }
}

/// Finishes a copy once its body fetch resolved.
pub fn complete_copy(
    cx: &mut Context<'_>,
    request_id: &str,
    target: &CopyTarget,
    body: Option<Arc<ResponseBody>>,
) -> Option<Action> {
    let request = cx
        .store
        .pending()
        .requests
        .iter()
        .find(|r| r.id == request_id)
        .cloned();
    let Some(request) = request else {
        tracing::debug!(%request_id, "copy target vanished before its body arrived");
        return None;
    };
    match cx.formatter.format(target, &request, body.as_deref()) {
        Some(text) => Some(copy_action(cx.store, cx.scheduler, target.label(), text)),
        None => {
            cx.store.post_status(
                cx.scheduler,
                StatusClass::Info,
                format!("{} unavailable", target.label()),
            );
            None
        }
    }
}

/// The modal command interpreter.
#[derive(Debug, Default)]
pub struct Interpreter {
    sequence: SequenceBuffer,
}

impl Interpreter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix key waiting for its second key, if any.
    #[must_use]
    pub const fn pending_prefix(&self) -> Option<char> {
        self.sequence.prefix()
    }

    /// Interprets one key press.
    ///
    /// # Parameters
    ///
    /// * `key` - The decoded key
    /// * `cx` - Store, scheduler and collaborators the command may touch
    ///
    /// # Returns
    ///
    /// Actions for the host, in order
    pub fn handle_key(&mut self, key: Key, cx: &mut Context<'_>) -> Vec<Action> {
        let _span = tracing::debug_span!("handle_key", ?key).entered();

        let state = cx.store.settled();
        let mode = state.mode;
        let focus = state.inspect.focus;
        let typing = state.inspect.search.as_ref().is_some_and(|s| s.editing);

        let allowed = allowed_sequences(mode, focus, typing);
        let mut actions = Vec::new();
        match self.sequence.feed(key, allowed, cx.scheduler) {
            Feed::Complete(sequence) => Self::run_sequence(sequence, cx, &mut actions),
            Feed::Started => {}
            Feed::Passthrough(key) => match mode {
                Mode::Normal => Self::normal(key, cx, &mut actions),
                Mode::Search => Self::search(key, cx),
                Mode::Filter => Self::filter(key, cx),
                Mode::Inspect if typing => Self::panel_search_input(key, focus, cx),
                Mode::Inspect => Self::inspect(key, focus, cx),
                Mode::Copy => Self::copy_menu(key, cx, &mut actions),
            },
        }

        if cx.store.settled().mode != mode {
            tracing::debug!(from = mode.label(), to = cx.store.pending().mode.label(), "mode change");
            self.sequence.clear();
        }
        actions
    }

    /// Handles a sequence deadline timer.
    ///
    /// A lone `y` commits as "copy value"; other prefixes are dropped.
    pub fn on_sequence_timeout(&mut self, generation: u64, cx: &mut Context<'_>) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.sequence.expire(generation) == Some('y') {
            Self::yank(false, cx, &mut actions);
        }
        actions
    }

    fn run_sequence(sequence: Sequence, cx: &mut Context<'_>, actions: &mut Vec<Action>) {
        let state = cx.store.settled();
        let (mode, focus) = (state.mode, state.inspect.focus);
        match sequence {
            Sequence::First if mode == Mode::Inspect => cx.panels.navigate_to(cx.store, focus, Edge::First),
            Sequence::First => cx.panels.list.navigate_to(cx.store, Edge::First),
            Sequence::DeleteSelected => {
                if let Some(request) = cx.store.selected_request() {
                    tracing::debug!(id = %request.id, "delete request");
                    cx.store.remove_request(&request.id);
                    cx.reconciler.forget(&request.id);
                }
            }
            Sequence::ClearAll => {
                cx.store.clear_requests();
                cx.reconciler.forget_all();
                cx.store.post_status(cx.scheduler, StatusClass::Info, "Cleared all requests");
            }
            Sequence::YankValue => Self::yank(false, cx, actions),
            Sequence::YankPath => Self::yank(true, cx, actions),
        }
    }

    fn normal(key: Key, cx: &mut Context<'_>, actions: &mut Vec<Action>) {
        let list = &mut cx.panels.list;
        match (key.bare, key.ctrl) {
            (BareKey::Char('j') | BareKey::Down, false) => list.move_selection(cx.store, 1),
            (BareKey::Char('k') | BareKey::Up, false) => list.move_selection(cx.store, -1),
            (BareKey::Char('G'), false) => list.navigate_to(cx.store, Edge::Last),
            (BareKey::Char('d'), true) | (BareKey::PageDown, _) => list.page(cx.store, 1),
            (BareKey::Char('u'), true) | (BareKey::PageUp, _) => list.page(cx.store, -1),
            (BareKey::Char('/'), false) => set_mode(cx.store, Mode::Search),
            (BareKey::Char('f'), false) => set_mode(cx.store, Mode::Filter),
            (BareKey::Enter, _) => {
                if cx.store.selected_request().is_some() {
                    let tab = cx.store.settled().preview_tab;
                    cx.store.set_state(StatePatch {
                        mode: Some(Mode::Inspect),
                        inspect: Some(InspectState {
                            focus: tab,
                            ..InspectState::default()
                        }),
                        ..StatePatch::default()
                    });
                }
            }
            (BareKey::Char('c'), false) => {
                if cx.store.selected_request().is_some() {
                    cx.store.set_state(StatePatch {
                        mode: Some(Mode::Copy),
                        copy_cursor: Some(0),
                        ..StatePatch::default()
                    });
                }
            }
            (BareKey::Char('q'), false) => actions.push(Action::Quit),
            (BareKey::Tab, _) => {
                let tab = cx.store.settled().preview_tab;
                set_tab(cx.store, tab.next());
            }
            (BareKey::BackTab, _) => {
                let tab = cx.store.settled().preview_tab;
                set_tab(cx.store, tab.prev());
            }
            (BareKey::Char(c @ '1'..='3'), false) => {
                let index = (c as usize) - ('1' as usize);
                set_tab(cx.store, Pane::ALL[index]);
            }
            (BareKey::Esc, _) => cx.store.set_state(StatePatch {
                search_query: Some(String::new()),
                ..StatePatch::default()
            }),
            (BareKey::Char('R'), false) => {
                tracing::info!("capture retry requested");
                cx.reconciler.ensure_capture_active(cx.store, cx.scheduler);
            }
            _ => tracing::trace!(?key, "unbound key in NORMAL"),
        }
    }

    fn search(key: Key, cx: &mut Context<'_>) {
        let mut query = cx.store.settled().search_query.clone();
        match key.bare {
            BareKey::Enter => return set_mode(cx.store, Mode::Normal),
            BareKey::Esc => {
                cx.store.set_state(StatePatch {
                    mode: Some(Mode::Normal),
                    search_query: Some(String::new()),
                    ..StatePatch::default()
                });
                return;
            }
            BareKey::Backspace => {
                query.pop();
            }
            _ => match key.printable() {
                Some(c) => query.push(c),
                None => return,
            },
        }
        cx.store.set_state(StatePatch {
            search_query: Some(query),
            ..StatePatch::default()
        });
    }

    fn filter(key: Key, cx: &mut Context<'_>) {
        let state = cx.store.settled();
        let mut filter = state.filter.clone();
        let last = filter.order.len().saturating_sub(1);
        let mut cursor = state.filter_cursor.min(last);

        if key.ctrl {
            return;
        }
        match key.bare {
            BareKey::Char('q') | BareKey::Esc => return set_mode(cx.store, Mode::Normal),
            BareKey::Char('h') | BareKey::Left => cursor = cursor.saturating_sub(1),
            BareKey::Char('l') | BareKey::Right => cursor = (cursor + 1).min(last),
            BareKey::Char(' ') | BareKey::Enter => {
                let Some(&kind) = filter.order.get(cursor) else {
                    return;
                };
                if !filter.selected.remove(&kind) {
                    filter.selected.insert(kind);
                }
                tracing::debug!(%kind, shown = filter.selected.contains(&kind), "filter toggled");
            }
            BareKey::Char('H') if cursor > 0 => {
                filter.order.swap(cursor, cursor - 1);
                cursor -= 1;
            }
            BareKey::Char('L') if cursor < last => {
                filter.order.swap(cursor, cursor + 1);
                cursor += 1;
            }
            BareKey::Char('a') => filter.selected.clear(),
            _ => return,
        }
        cx.store.set_state(StatePatch {
            filter: Some(filter),
            filter_cursor: Some(cursor),
            ..StatePatch::default()
        });
    }

    fn inspect(key: Key, focus: Pane, cx: &mut Context<'_>) {
        let panels = &*cx.panels;
        match (key.bare, key.ctrl) {
            (BareKey::Char('q'), false) => {
                cx.store.set_state(StatePatch {
                    mode: Some(Mode::Normal),
                    inspect: Some(InspectState::default()),
                    ..StatePatch::default()
                });
            }
            (BareKey::Tab, _) => set_focus(cx.store, focus.next()),
            (BareKey::BackTab, _) => set_focus(cx.store, focus.prev()),
            (BareKey::Char('H'), false) => set_focus(cx.store, Pane::Headers),
            (BareKey::Char('L'), false) => set_focus(cx.store, Pane::Response),
            (BareKey::Char('P'), false) => set_focus(cx.store, Pane::Preview),
            (BareKey::Char('w'), false) => {
                let mut inspect = cx.store.settled().inspect.clone();
                inspect.full_width = !inspect.full_width;
                set_inspect(cx.store, inspect);
            }
            (BareKey::Char('/'), false) => {
                let mut inspect = cx.store.settled().inspect.clone();
                inspect.search = Some(PanelSearch {
                    editing: true,
                    ..PanelSearch::default()
                });
                set_inspect(cx.store, inspect);
            }
            (BareKey::Char('n'), false) => panels.search_step(cx.store, focus, true),
            (BareKey::Char('N'), false) => panels.search_step(cx.store, focus, false),
            (BareKey::Esc, _) => {
                let mut inspect = cx.store.settled().inspect.clone();
                inspect.search = None;
                set_inspect(cx.store, inspect);
            }
            (BareKey::Char('j') | BareKey::Down, false) => panels.move_cursor(cx.store, focus, 1),
            (BareKey::Char('k') | BareKey::Up, false) => panels.move_cursor(cx.store, focus, -1),
            (BareKey::Char('G'), false) => panels.navigate_to(cx.store, focus, Edge::Last),
            (BareKey::Char('d'), true) | (BareKey::PageDown, _) => panels.page(cx.store, focus, 1),
            (BareKey::Char('u'), true) | (BareKey::PageUp, _) => panels.page(cx.store, focus, -1),
            (BareKey::Char(' ') | BareKey::Enter, false) => match focus {
                Pane::Headers => panels.toggle_section(cx.store),
                Pane::Preview => panels.toggle_node(cx.store),
                Pane::Response => {}
            },
            (BareKey::Char('l') | BareKey::Right, false) if focus == Pane::Preview => panels.expand_node(cx.store),
            (BareKey::Char('h') | BareKey::Left, false) if focus == Pane::Preview => {
                panels.collapse_node(cx.store);
            }
            _ => tracing::trace!(?key, focus = focus.label(), "unbound key in INSPECT"),
        }
    }

    fn panel_search_input(key: Key, focus: Pane, cx: &mut Context<'_>) {
        let mut inspect = cx.store.settled().inspect.clone();
        let Some(search) = inspect.search.as_mut() else {
            return;
        };
        match key.bare {
            BareKey::Enter => return cx.panels.search_commit(cx.store, focus),
            BareKey::Esc => inspect.search = None,
            BareKey::Backspace => {
                search.query.pop();
            }
            _ => match key.printable() {
                Some(c) => search.query.push(c),
                None => return,
            },
        }
        set_inspect(cx.store, inspect);
    }

    fn copy_menu(key: Key, cx: &mut Context<'_>, actions: &mut Vec<Action>) {
        let cursor = cx.store.settled().copy_cursor;
        let last = CopyTarget::MENU.len() - 1;
        let target = match key.bare {
            BareKey::Char('q') | BareKey::Esc => return set_mode(cx.store, Mode::Normal),
            BareKey::Char('j') | BareKey::Down => {
                return set_copy_cursor(cx.store, (cursor + 1).min(last));
            }
            BareKey::Char('k') | BareKey::Up => return set_copy_cursor(cx.store, cursor.saturating_sub(1)),
            BareKey::Enter => CopyTarget::MENU.get(cursor).map(|(_, target)| target.clone()),
            BareKey::Char(c) if !key.ctrl => CopyTarget::MENU
                .iter()
                .find(|(hotkey, _)| *hotkey == c)
                .map(|(_, target)| target.clone()),
            _ => None,
        };
        let Some(target) = target else {
            return;
        };
        set_mode(cx.store, Mode::Normal);
        actions.extend(copy_target(cx, target));
    }

    /// Copies the value under the cursor (or its path / name form).
    fn yank(with_path: bool, cx: &mut Context<'_>, actions: &mut Vec<Action>) {
        let state = cx.store.settled();
        let (mode, focus) = (state.mode, state.inspect.focus);
        let target = match (mode, focus) {
            (Mode::Normal, _) => CopyTarget::Url,
            (Mode::Inspect, Pane::Response) => CopyTarget::ResponseBody,
            (Mode::Inspect, Pane::Headers) => {
                let Some(request) = cx.store.selected_request() else {
                    return;
                };
                let state = cx.store.settled();
                let rows = header_rows(&request, &state.collapsed_sections);
                match rows.get(state.panels.headers.selected) {
                    Some(HeaderRow::Field { name, value, .. }) => CopyTarget::HeaderValue {
                        name: name.clone(),
                        value: value.clone(),
                        with_name: with_path,
                    },
                    _ => return,
                }
            }
            (Mode::Inspect, Pane::Preview) => {
                let state = cx.store.settled();
                let node = state.json_nodes.get(state.panels.preview.selected);
                match (&state.preview, node) {
                    (PreviewDocument::Json(_), Some(node)) if with_path => CopyTarget::NodePath {
                        path: node.path.clone(),
                    },
                    (PreviewDocument::Json(_), Some(node)) => CopyTarget::NodeValue {
                        pointer: node.pointer.clone(),
                    },
                    (PreviewDocument::Raw(_), _) if !with_path => CopyTarget::ResponseBody,
                    _ => return,
                }
            }
            _ => return,
        };
        actions.extend(copy_target(cx, target));
    }
}

/// Copies `target` of the selected request, fetching the body first when
/// the target needs one that is not loaded yet.
fn copy_target(cx: &mut Context<'_>, target: CopyTarget) -> Option<Action> {
    let request = cx.store.selected_request()?;
    if target.needs_body() && request.response_body.is_none() {
        let waiter = BodyWaiter::Copy {
            request_id: request.id.clone(),
            target: target.clone(),
        };
        match cx.reconciler.fetch_body(&request.id, waiter, cx.store) {
            BodyFetch::Ready(body) => return complete_copy(cx, &request.id, &target, body),
            BodyFetch::Pending => {
                cx.store
                    .post_status(cx.scheduler, StatusClass::Info, "Fetching response body...");
                return None;
            }
        }
    }
    let body = request.response_body.clone();
    complete_copy(cx, &request.id, &target, body)
}

fn set_mode(store: &mut Store, mode: Mode) {
    store.set_state(StatePatch {
        mode: Some(mode),
        ..StatePatch::default()
    });
}

fn set_tab(store: &mut Store, tab: Pane) {
    store.set_state(StatePatch {
        preview_tab: Some(tab),
        ..StatePatch::default()
    });
}

fn set_focus(store: &mut Store, focus: Pane) {
    let mut inspect = store.settled().inspect.clone();
    inspect.focus = focus;
    inspect.search = None;
    set_inspect(store, inspect);
}

fn set_inspect(store: &mut Store, inspect: InspectState) {
    store.set_state(StatePatch {
        inspect: Some(inspect),
        ..StatePatch::default()
    });
}

fn set_copy_cursor(store: &mut Store, cursor: usize) {
    store.set_state(StatePatch {
        copy_cursor: Some(cursor),
        ..StatePatch::default()
    });
}
