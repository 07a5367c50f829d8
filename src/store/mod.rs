//! The central store.
//!
//! Writes never touch the published snapshot directly. They land in a working
//! copy (cloned lazily from the snapshot on the first write of a tick) and are
//! committed by [`Store::flush`], which the scheduler tick calls exactly once.
//! A flush re-derives the filtered view, re-clamps the selection, refreshes
//! the JSON preview rows and then notifies every subscriber once, no matter
//! how many writes happened during the tick.

mod fuzzy;
pub mod state;

pub use fuzzy::{highlight_ranges, FuzzyIndex};
pub use state::{
    AppState, CaptureStatus, FilterState, InspectState, PanelCursor, PanelCursors, PanelSearch,
    PreviewDocument, StatePatch, StatusClass, StatusMessage, MAX_REQUESTS,
};

use crate::app::scheduler::{Scheduler, Timer};
use crate::domain::{Request, ResourceType, ResponseBody};
use crate::tree::{flatten, ExpansionMap};
use base64::Engine as _;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Delay before info and success messages clear themselves.
pub const STATUS_CLEAR_MS: u64 = 3_000;

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&AppState)>;

/// Memo of the last filtered view and the inputs that produced it.
struct ViewMemo {
    requests_revision: u64,
    query: String,
    selected: BTreeSet<ResourceType>,
    view: Arc<[Arc<Request>]>,
}

/// Identity of the inputs behind `AppState::json_nodes`.
#[derive(Debug, Clone, PartialEq)]
struct PreviewKey {
    request_id: Option<String>,
    body: Option<usize>,
    expansion_revision: u64,
}

pub struct Store {
    committed: Arc<AppState>,
    working: Option<AppState>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    next_status_id: u64,
    view_memo: Option<ViewMemo>,
    fuzzy: FuzzyIndex,
    preview_key: Option<PreviewKey>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("requests", &self.committed.requests.len())
            .field("dirty", &self.working.is_some())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl Store {
    #[must_use]
    pub fn new(initial: AppState) -> Self {
        Self {
            committed: Arc::new(initial),
            working: None,
            listeners: Vec::new(),
            next_subscription: 0,
            next_status_id: 0,
            view_memo: None,
            fuzzy: FuzzyIndex::default(),
            preview_key: None,
        }
    }

    /// Returns the last committed snapshot.
    #[must_use]
    pub fn get_state(&self) -> Arc<AppState> {
        Arc::clone(&self.committed)
    }

    fn working(&mut self) -> &mut AppState {
        self.working
            .get_or_insert_with(|| (*self.committed).clone())
    }

    /// Read access to pending state, falling back to the snapshot.
    ///
    /// Used by collaborators that must read-modify-write within a tick.
    #[must_use]
    pub fn pending(&self) -> &AppState {
        self.working.as_ref().unwrap_or(&self.committed)
    }

    /// Merges `patch` into the working state.
    pub fn set_state(&mut self, patch: StatePatch) {
        tracing::trace!(?patch, "state patch queued");
        patch.apply(self.working());
    }

    /// Registers a listener invoked once per committed flush.
    pub fn subscribe(&mut self, listener: impl FnMut(&AppState) + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener; returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    // ----- request collection -------------------------------------------------

    /// Inserts `request`, or replaces the live record with the same id in place.
    ///
    /// New records beyond [`MAX_REQUESTS`] evict the oldest ones; the selection
    /// shifts down by the number evicted. Returns the ids of evicted records.
    pub fn upsert_request(&mut self, request: Request) -> Vec<String> {
        let state = self.working();
        let requests = Arc::make_mut(&mut state.requests);

        if let Some(slot) = requests.iter_mut().find(|r| r.id == request.id) {
            let version = slot.version.wrapping_add(1);
            *slot = Arc::new(Request { version, ..request });
            state.requests_revision += 1;
            state.index_revision += 1;
            return Vec::new();
        }

        requests.push(Arc::new(request));
        let overflow = requests.len().saturating_sub(MAX_REQUESTS);
        let evicted: Vec<String> = requests.drain(..overflow).map(|r| r.id.clone()).collect();
        if !evicted.is_empty() {
            state.selected_index = state.selected_index.saturating_sub(evicted.len());
            tracing::debug!(evicted = evicted.len(), "request cap reached, evicted oldest");
        }
        state.requests_revision += 1;
        state.index_revision += 1;
        evicted
    }

    /// Replaces the record `id` with a copy transformed by `f`.
    ///
    /// Returns false when no live request has that id.
    pub fn update_request(&mut self, id: &str, f: impl FnOnce(&mut Request)) -> bool {
        if !self.pending().requests.iter().any(|r| r.id == id) {
            return false;
        }
        let state = self.working();
        let requests = Arc::make_mut(&mut state.requests);
        if let Some(slot) = requests.iter_mut().find(|r| r.id == id) {
            *slot = Arc::new(slot.updated(f));
        }
        state.requests_revision += 1;
        true
    }

    /// Removes the record `id`; returns false when it was not live.
    pub fn remove_request(&mut self, id: &str) -> bool {
        if !self.pending().requests.iter().any(|r| r.id == id) {
            return false;
        }
        let state = self.working();
        Arc::make_mut(&mut state.requests).retain(|r| r.id != id);
        state.requests_revision += 1;
        state.index_revision += 1;
        true
    }

    /// Drops every request.
    pub fn clear_requests(&mut self) {
        let state = self.working();
        state.requests = Arc::new(Vec::new());
        state.selected_index = 0;
        state.requests_revision += 1;
        state.index_revision += 1;
    }

    /// Read-only snapshot of every committed request, for external exporters.
    #[must_use]
    pub fn export_snapshot(&self) -> Arc<Vec<Arc<Request>>> {
        Arc::clone(&self.committed.requests)
    }

    // ----- derived views -----------------------------------------------------

    /// Requests after fuzzy search and resource-type filtering.
    ///
    /// With a query, results are ordered by descending relevance; without one,
    /// insertion order is kept. The same `Arc` is returned until the requests,
    /// the query, or the filter selection change. Reflects pending writes.
    pub fn filtered_view(&mut self) -> Arc<[Arc<Request>]> {
        let state = self.working.as_ref().unwrap_or(&*self.committed);
        compute_view(&mut self.view_memo, &mut self.fuzzy, state)
    }

    /// The request under the cursor in the pending state.
    pub fn selected_request(&mut self) -> Option<Arc<Request>> {
        let view = self.filtered_view();
        let index = self.pending().selected_index.min(view.len().saturating_sub(1));
        view.get(index).cloned()
    }

    /// Brings derived fields of the pending state up to date (clamped
    /// selection, preview document, JSON rows) without committing, and
    /// returns it.
    pub fn settled(&mut self) -> &AppState {
        if let Some(mut working) = self.working.take() {
            self.settle(&mut working);
            self.working = Some(working);
        }
        self.pending()
    }

    fn settle(&mut self, state: &mut AppState) {
        let view = compute_view(&mut self.view_memo, &mut self.fuzzy, state);
        state.selected_index = if view.is_empty() {
            0
        } else {
            state.selected_index.min(view.len() - 1)
        };
        let selected = view.get(state.selected_index).cloned();
        self.refresh_preview(state, selected.as_deref());
    }

    // ----- status messages ---------------------------------------------------

    /// Shows a status message.
    ///
    /// Errors always replace the current message and persist. Info and success
    /// messages never displace an active error and clear themselves after
    /// [`STATUS_CLEAR_MS`]. Returns false when the message was suppressed.
    pub fn post_status(&mut self, scheduler: &mut Scheduler, class: StatusClass, text: impl Into<String>) -> bool {
        let text = text.into();
        let blocked = self
            .pending()
            .status
            .as_ref()
            .is_some_and(|current| current.class == StatusClass::Error && class != StatusClass::Error);
        if blocked {
            tracing::debug!(%text, "status suppressed by active error");
            return false;
        }

        self.next_status_id += 1;
        let id = self.next_status_id;
        if class != StatusClass::Error {
            scheduler.schedule(STATUS_CLEAR_MS, Timer::StatusClear { id });
        }
        tracing::debug!(id, ?class, %text, "status posted");
        self.working().status = Some(StatusMessage { id, class, text });
        true
    }

    /// Clears the message `id` if it is still showing (auto-clear timers).
    pub fn expire_status(&mut self, id: u64) {
        if self.pending().status.as_ref().is_some_and(|s| s.id == id) {
            self.working().status = None;
        }
    }

    /// Clears an active error once its cause is resolved.
    pub fn resolve_error(&mut self) {
        if self
            .pending()
            .status
            .as_ref()
            .is_some_and(|s| s.class == StatusClass::Error)
        {
            self.working().status = None;
        }
    }

    // ----- commit ------------------------------------------------------------

    /// Commits pending writes and notifies subscribers once.
    ///
    /// Returns false (and notifies nobody) when nothing was written.
    pub fn flush(&mut self) -> bool {
        let Some(mut next) = self.working.take() else {
            return false;
        };
        let _span = tracing::debug_span!("store_flush", requests = next.requests.len()).entered();

        self.settle(&mut next);

        self.committed = Arc::new(next);

        let snapshot = Arc::clone(&self.committed);
        for (_, listener) in &mut self.listeners {
            listener(&snapshot);
        }
        true
    }

    /// Keeps `preview`, `json_nodes` and pane cursors consistent with the
    /// selected request, its body and the expansion map.
    fn refresh_preview(&mut self, state: &mut AppState, selected: Option<&Request>) {
        let request_id = selected.map(|r| r.id.clone());
        if request_id != state.preview_request {
            state.preview_request.clone_from(&request_id);
            state.panels = PanelCursors::default();
            state.expansion = ExpansionMap::new();
            state.inspect.search = None;
        }

        let body = selected.and_then(|r| r.response_body.clone());
        let key = PreviewKey {
            request_id,
            body: body.as_ref().map(|b| Arc::as_ptr(b) as usize),
            expansion_revision: state.expansion.revision(),
        };
        if self.preview_key.as_ref() == Some(&key) {
            return;
        }

        let body_changed = self
            .preview_key
            .as_ref()
            .map_or(true, |old| old.request_id != key.request_id || old.body != key.body);
        if body_changed {
            state.preview = body.as_deref().map_or(PreviewDocument::Empty, parse_body);
        }

        state.json_nodes = Arc::new(match &state.preview {
            PreviewDocument::Json(value) => flatten(value, &state.expansion).collect(),
            _ => Vec::new(),
        });
        if let PreviewDocument::Json(_) = state.preview {
            let rows = state.json_nodes.len();
            state.panels.preview.selected = state.panels.preview.selected.min(rows.saturating_sub(1));
        }
        self.preview_key = Some(key);
    }
}

/// Recomputes the filtered view of `state` unless `memo` already holds it.
fn compute_view(memo: &mut Option<ViewMemo>, fuzzy: &mut FuzzyIndex, state: &AppState) -> Arc<[Arc<Request>]> {
    if let Some(memo) = memo.as_ref() {
        if memo.requests_revision == state.requests_revision
            && memo.query == state.search_query
            && memo.selected == state.filter.selected
        {
            return Arc::clone(&memo.view);
        }
    }

    let _span = tracing::debug_span!(
        "filtered_view",
        total = state.requests.len(),
        query_len = state.search_query.len(),
        filters = state.filter.selected.len()
    )
    .entered();

    let searched: Vec<&Arc<Request>> = if state.search_query.trim().is_empty() {
        state.requests.iter().collect()
    } else {
        fuzzy.sync(state.index_revision, &state.requests);
        fuzzy
            .rank(&state.search_query)
            .into_iter()
            .filter_map(|(position, _)| state.requests.get(position))
            .collect()
    };

    let view: Arc<[Arc<Request>]> = searched
        .into_iter()
        .filter(|request| state.filter.admits(request.resource_type))
        .cloned()
        .collect();

    tracing::debug!(visible = view.len(), "filtered view recomputed");

    *memo = Some(ViewMemo {
        requests_revision: state.requests_revision,
        query: state.search_query.clone(),
        selected: state.filter.selected.clone(),
        view: Arc::clone(&view),
    });
    view
}

/// Parses a body for preview; anything that is not JSON stays raw text.
fn parse_body(body: &ResponseBody) -> PreviewDocument {
    let decoded;
    let text = if body.base64_encoded {
        match base64::engine::general_purpose::STANDARD
            .decode(body.text.as_bytes())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
        {
            Some(utf8) => {
                decoded = utf8;
                decoded.as_str()
            }
            None => return PreviewDocument::Raw(Arc::from(format!("<binary body, {} bytes base64>", body.text.len()))),
        }
    } else {
        body.text.as_str()
    };

    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => PreviewDocument::Json(Arc::new(value)),
        Err(e) => {
            tracing::trace!(error = %e, "body is not JSON, keeping raw text");
            PreviewDocument::Raw(Arc::from(text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::state::FilterState;
    use std::cell::Cell;
    use std::rc::Rc;

    fn request(id: &str, url: &str, resource_type: ResourceType) -> Request {
        let mut r = Request::new(id, url, "GET");
        r.resource_type = resource_type;
        r
    }

    #[test]
    fn writes_are_invisible_until_flush() {
        let mut store = Store::default();
        store.upsert_request(request("a", "https://a.test/x", ResourceType::Xhr));
        assert!(store.get_state().requests.is_empty());
        assert!(store.flush());
        assert_eq!(store.get_state().requests.len(), 1);
        assert!(!store.flush());
    }

    #[test]
    fn many_writes_notify_once() {
        let mut store = Store::default();
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        store.subscribe(move |_| seen.set(seen.get() + 1));

        for i in 0..10 {
            store.upsert_request(request(&i.to_string(), "https://a.test/x", ResourceType::Xhr));
            store.set_state(StatePatch {
                search_query: Some(format!("q{i}")),
                ..StatePatch::default()
            });
        }
        store.flush();
        assert_eq!(calls.get(), 1);
        assert_eq!(store.get_state().search_query, "q9");
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut store = Store::default();
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let id = store.subscribe(move |_| seen.set(seen.get() + 1));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.clear_requests();
        store.flush();
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn eviction_drops_oldest_and_rebases_selection() {
        let mut store = Store::default();
        for i in 0..MAX_REQUESTS {
            store.upsert_request(request(&i.to_string(), "https://a.test/x", ResourceType::Xhr));
        }
        store.set_state(StatePatch {
            selected_index: Some(10),
            ..StatePatch::default()
        });
        let evicted = store.upsert_request(request("new", "https://a.test/y", ResourceType::Xhr));
        store.flush();

        let state = store.get_state();
        assert_eq!(evicted, ["0"]);
        assert_eq!(state.requests.len(), MAX_REQUESTS);
        assert_eq!(state.requests[0].id, "1");
        assert_eq!(state.requests.last().map(|r| r.id.as_str()), Some("new"));
        assert_eq!(state.selected_index, 9);
    }

    #[test]
    fn duplicate_id_updates_in_place() {
        let mut store = Store::default();
        store.upsert_request(request("a", "https://a.test/x", ResourceType::Xhr));
        store.upsert_request(request("b", "https://a.test/y", ResourceType::Xhr));
        store.upsert_request(request("a", "https://a.test/redirected", ResourceType::Xhr));
        store.flush();
        let state = store.get_state();
        assert_eq!(state.requests.len(), 2);
        assert_eq!(state.requests[0].url, "https://a.test/redirected");
        assert_eq!(state.requests[0].version, 1);
    }

    #[test]
    fn filtered_view_is_memoized() {
        let mut store = Store::default();
        store.upsert_request(request("a", "https://a.test/x", ResourceType::Xhr));
        store.flush();
        let first = store.filtered_view();
        let second = store.filtered_view();
        assert!(Arc::ptr_eq(&first, &second));

        store.update_request("a", |r| r.status = 200);
        store.flush();
        assert!(!Arc::ptr_eq(&first, &store.filtered_view()));
    }

    #[test]
    fn type_filter_intersects() {
        let mut store = Store::default();
        store.upsert_request(request("a", "https://a.test/app.js", ResourceType::Script));
        store.upsert_request(request("b", "https://a.test/api", ResourceType::Fetch));
        let mut filter = FilterState::default();
        filter.selected.insert(ResourceType::Fetch);
        store.set_state(StatePatch {
            filter: Some(filter),
            ..StatePatch::default()
        });
        store.flush();
        let view = store.filtered_view();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, "b");
    }

    #[test]
    fn selection_is_clamped_to_view() {
        let mut store = Store::default();
        store.upsert_request(request("a", "https://a.test/alpha", ResourceType::Xhr));
        store.upsert_request(request("b", "https://a.test/beta", ResourceType::Xhr));
        store.set_state(StatePatch {
            selected_index: Some(1),
            ..StatePatch::default()
        });
        store.flush();
        store.set_state(StatePatch {
            search_query: Some("alpha".into()),
            ..StatePatch::default()
        });
        store.flush();
        assert_eq!(store.get_state().selected_index, 0);
    }

    #[test]
    fn info_does_not_replace_error() {
        let mut store = Store::default();
        let mut scheduler = Scheduler::new(0);
        assert!(store.post_status(&mut scheduler, StatusClass::Error, "attach failed"));
        assert!(!store.post_status(&mut scheduler, StatusClass::Info, "3 requests"));
        store.flush();
        let status = store.get_state().status.clone().expect("status");
        assert_eq!(status.class, StatusClass::Error);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn info_auto_clears() {
        let mut store = Store::default();
        let mut scheduler = Scheduler::new(0);
        store.post_status(&mut scheduler, StatusClass::Info, "copied");
        store.flush();
        for timer in scheduler.advance(STATUS_CLEAR_MS) {
            if let Timer::StatusClear { id } = timer {
                store.expire_status(id);
            }
        }
        store.flush();
        assert!(store.get_state().status.is_none());
    }

    #[test]
    fn malformed_body_is_kept_raw() {
        let mut store = Store::default();
        let mut r = request("a", "https://a.test/x", ResourceType::Xhr);
        r.response_body = Some(Arc::new(ResponseBody {
            text: "{not json".into(),
            base64_encoded: false,
        }));
        store.upsert_request(r);
        store.flush();
        let state = store.get_state();
        assert_eq!(state.preview, PreviewDocument::Raw(Arc::from("{not json")));
        assert!(state.json_nodes.is_empty());
    }

    #[test]
    fn json_body_is_flattened_and_follows_expansion() {
        let mut store = Store::default();
        let mut r = request("a", "https://a.test/x", ResourceType::Fetch);
        r.response_body = Some(Arc::new(ResponseBody {
            text: r#"{"data":{"id":1,"tags":["x"]}}"#.into(),
            base64_encoded: false,
        }));
        store.upsert_request(r);
        store.flush();
        assert_eq!(store.get_state().json_nodes.len(), 4);

        let mut expansion = store.get_state().expansion.clone();
        expansion.toggle("data");
        store.set_state(StatePatch {
            expansion: Some(expansion),
            ..StatePatch::default()
        });
        store.flush();
        assert_eq!(store.get_state().json_nodes.len(), 1);
    }
}
