//! The application runtime.
//!
//! [`App`] owns the store, the scheduler, the reconciler and the interpreter
//! and is the only thing the terminal host talks to. One host loop iteration
//! is: feed keys with [`App::handle_key`], then call [`App::tick`], then draw
//! [`App::render`] if the state changed.
//!
//! ```text
//! keys ──► Interpreter ─┐
//!                       ├─► Store (working copy) ──flush──► committed snapshot ──► render
//! capture ─► Reconciler ┘           ▲
//! timers ──► Scheduler ─────────────┘
//! ```

use super::actions::Action;
use super::copy::{CopyFormatter, DefaultCopyFormatter};
use super::interpreter::{complete_copy, BodyWaiter, Context, Interpreter};
use super::keys::Key;
use super::scheduler::{Millis, Scheduler, Timer};
use crate::capture::{BodyDelivery, BodyFetch, CaptureEvent, CaptureSource, Reconciler, RetryPolicy};
use crate::domain::Request;
use crate::storage::Preferences;
use crate::store::{AppState, FilterState, StatusClass, Store, SubscriptionId};
use crate::ui::panels::{previewed_request, Panels};
use crate::ui::{compute_viewmodel, render, Layout, Theme, ViewContext};
use std::sync::Arc;

/// Construction options for [`App`].
pub struct AppOptions {
    /// Rows rendered above and below the list viewport.
    pub buffer_rows: usize,
    pub retry: RetryPolicy,
    pub theme: Theme,
    pub formatter: Box<dyn CopyFormatter>,
    /// Where filter preferences are read from and written to. `None` keeps
    /// them in memory only.
    pub preferences: Option<Preferences>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            buffer_rows: 5,
            retry: RetryPolicy::default(),
            theme: Theme::default(),
            formatter: Box::new(DefaultCopyFormatter),
            preferences: None,
        }
    }
}

/// The netmodal application.
pub struct App {
    store: Store,
    scheduler: Scheduler,
    reconciler: Reconciler<BodyWaiter>,
    interpreter: Interpreter,
    panels: Panels,
    formatter: Box<dyn CopyFormatter>,
    preferences: Option<Preferences>,
    theme: Theme,
    rows: usize,
    cols: usize,
    /// Request id and version the preview body was last requested for.
    preview_fetch: Option<(String, u64)>,
    /// Filter state as last written to preferences.
    saved_filter: FilterState,
    /// Actions produced outside a key press (copies completed by a body
    /// delivery, lone-`y` yanks), handed out by the next `tick`.
    outbox: Vec<Action>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("store", &self.store)
            .field("scheduler", &self.scheduler)
            .field("reconciler", &self.reconciler)
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Creates the app at clock time `now`.
    ///
    /// Filter preferences are loaded here; capture is not started until
    /// [`App::start`].
    pub fn new(source: Box<dyn CaptureSource>, options: AppOptions, now: Millis) -> Self {
        let filter = options
            .preferences
            .as_ref()
            .map(Preferences::load_filter)
            .unwrap_or_default();
        tracing::debug!(selected = filter.selected.len(), "app created");

        let initial = AppState {
            filter: filter.clone(),
            ..AppState::default()
        };

        Self {
            store: Store::new(initial),
            scheduler: Scheduler::new(now),
            reconciler: Reconciler::new(source, options.retry),
            interpreter: Interpreter::new(),
            panels: Panels::new(options.buffer_rows),
            formatter: options.formatter,
            preferences: options.preferences,
            theme: options.theme,
            rows: 24,
            cols: 80,
            preview_fetch: None,
            saved_filter: filter,
            outbox: Vec::new(),
        }
    }

    /// Starts capture and commits the resulting state.
    pub fn start(&mut self) {
        self.reconciler
            .ensure_capture_active(&mut self.store, &mut self.scheduler);
        self.commit();
    }

    /// Committed state snapshot.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        self.store.get_state()
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Registers a listener called once per committed batch of updates.
    pub fn subscribe(&mut self, listener: impl FnMut(&AppState) + 'static) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    /// Earliest pending timer deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Millis> {
        self.scheduler.next_deadline()
    }

    /// Read-only copy of every committed request, for external exporters.
    #[must_use]
    pub fn export_snapshot(&self) -> Arc<Vec<Arc<Request>>> {
        self.store.export_snapshot()
    }

    /// Records the terminal size and recomputes the viewport heights.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        tracing::debug!(rows, cols, "resize");
        self.rows = rows;
        self.cols = cols;
        self.apply_layout();
    }

    fn apply_layout(&mut self) -> Layout {
        let layout = Layout::compute(self.store.settled(), self.rows, self.cols);
        self.panels.set_layout(layout.list_rows(), layout.detail_rows());
        layout
    }

    fn split(&mut self) -> (&mut Interpreter, Context<'_>) {
        (
            &mut self.interpreter,
            Context {
                store: &mut self.store,
                scheduler: &mut self.scheduler,
                reconciler: &mut self.reconciler,
                panels: &mut self.panels,
                formatter: self.formatter.as_ref(),
            },
        )
    }

    /// Handles one key press at time `now`.
    ///
    /// Timers due at `now` fire first, so a sequence prefix that has already
    /// expired is not completed by this key.
    ///
    /// # Returns
    ///
    /// Actions for the host, in order
    pub fn handle_key(&mut self, key: Key, now: Millis) -> Vec<Action> {
        self.fire_timers(now);
        // The layout depends on mode (search box, full width INSPECT), so it
        // is refreshed before navigation uses the viewport heights.
        self.apply_layout();

        let (interpreter, mut cx) = self.split();
        let actions = interpreter.handle_key(key, &mut cx);
        self.outbox.extend(actions);

        self.fetch_preview_body();
        self.commit();
        std::mem::take(&mut self.outbox)
    }

    /// Applies one capture event.
    pub fn handle_capture(&mut self, event: CaptureEvent) {
        let deliveries = self
            .reconciler
            .handle_event(event, &mut self.store, &mut self.scheduler);
        self.deliver(deliveries);
    }

    /// Drains and applies everything the capture source reported.
    ///
    /// # Returns
    ///
    /// Number of events applied
    pub fn pump_capture(&mut self) -> usize {
        let events = self.reconciler.poll_source();
        let count = events.len();
        for event in events {
            self.handle_capture(event);
        }
        count
    }

    /// Advances the clock to `now`.
    ///
    /// Drains the capture source, fires due timers, requests the preview
    /// body if needed, then commits everything as one batch.
    ///
    /// # Returns
    ///
    /// Actions for the host that were produced since the last call
    pub fn tick(&mut self, now: Millis) -> Vec<Action> {
        self.pump_capture();
        self.fire_timers(now);
        self.fetch_preview_body();
        self.commit();
        std::mem::take(&mut self.outbox)
    }

    fn fire_timers(&mut self, now: Millis) {
        loop {
            let due = self.scheduler.advance(now);
            if due.is_empty() {
                break;
            }
            for timer in due {
                tracing::trace!(?timer, "timer fired");
                match timer {
                    Timer::SequenceTimeout { generation } => {
                        let (interpreter, mut cx) = self.split();
                        let actions = interpreter.on_sequence_timeout(generation, &mut cx);
                        self.outbox.extend(actions);
                    }
                    Timer::StatusClear { id } => self.store.expire_status(id),
                    Timer::AttachRetry | Timer::Reattach => {
                        self.reconciler
                            .on_timer(timer, &mut self.store, &mut self.scheduler);
                    }
                }
            }
        }
    }

    fn deliver(&mut self, deliveries: Vec<BodyDelivery<BodyWaiter>>) {
        for (waiter, body) in deliveries {
            match waiter {
                BodyWaiter::Preview => {
                    if body.is_none() {
                        self.store
                            .post_status(&mut self.scheduler, StatusClass::Info, "Response body unavailable");
                    }
                }
                BodyWaiter::Copy { request_id, target } => {
                    let (_, mut cx) = self.split();
                    if let Some(action) = complete_copy(&mut cx, &request_id, &target, body) {
                        self.outbox.push(action);
                    }
                }
            }
        }
    }

    /// Requests the body of the previewed request once per (id, version).
    fn fetch_preview_body(&mut self) {
        let Some(request) = previewed_request(self.store.settled()).cloned() else {
            self.preview_fetch = None;
            return;
        };
        if request.response_body.is_some() || request.failed || request.is_pending() {
            return;
        }
        let key = (request.id.clone(), request.version);
        if self.preview_fetch.as_ref() == Some(&key) {
            return;
        }
        self.preview_fetch = Some(key);

        match self
            .reconciler
            .fetch_body(&request.id, BodyWaiter::Preview, &self.store)
        {
            BodyFetch::Ready(Some(body)) => {
                self.store
                    .update_request(&request.id, |r| r.response_body = Some(body));
            }
            BodyFetch::Ready(None) => {
                self.store
                    .post_status(&mut self.scheduler, StatusClass::Info, "Response body unavailable");
            }
            BodyFetch::Pending => tracing::trace!(id = %request.id, "preview body requested"),
        }
    }

    /// Flushes the store and persists a changed filter.
    fn commit(&mut self) -> bool {
        if !self.store.flush() {
            return false;
        }
        let state = self.store.get_state();
        if state.filter != self.saved_filter {
            self.saved_filter = state.filter.clone();
            if let Some(preferences) = self.preferences.as_mut() {
                if let Err(e) = preferences.save_filter(&state.filter) {
                    tracing::warn!(error = %e, "failed to save filter preferences");
                }
            }
        }
        true
    }

    /// Renders the committed state as a full ANSI frame.
    pub fn render(&mut self) -> String {
        let layout = self.apply_layout();
        let state = self.store.get_state();
        let view = self.store.filtered_view();
        self.panels
            .list
            .reconcile(&view, state.selected_index, &state.search_query);

        let vm = compute_viewmodel(
            &state,
            &self.panels.list,
            ViewContext {
                shown: view.len(),
                detail_height: layout.detail_rows(),
                pending_prefix: self.interpreter.pending_prefix(),
            },
        );
        let frame = render(&vm, &layout, &self.theme);
        if let Some(height) = frame.list_row_height {
            let list = self.panels.list.virtual_list_mut();
            if list.record_measurement(height) {
                list.scroll_into_view(state.selected_index);
            }
        }
        frame.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::NullSource;
    use crate::domain::ResourceType;
    use crate::storage::{MemoryPreferences, PreferenceStore, SELECTED_FILTERS_KEY};
    use crate::store::CaptureStatus;
    use serde_json::json;

    #[test]
    fn start_without_bridge_reports_failure() {
        let mut app = App::new(Box::new(NullSource), AppOptions::default(), 0);
        app.start();
        let state = app.state();
        assert_eq!(state.capture, CaptureStatus::Failed);
        assert_eq!(state.status.as_ref().map(|s| s.class), Some(StatusClass::Error));
    }

    #[test]
    fn stored_filter_is_applied_at_startup() {
        let mut backend = MemoryPreferences::default();
        backend.set(SELECTED_FILTERS_KEY, json!(["fetch"])).unwrap();
        let options = AppOptions {
            preferences: Some(Preferences::new(Box::new(backend))),
            ..AppOptions::default()
        };
        let app = App::new(Box::new(NullSource), options, 0);
        assert!(app.state().filter.selected.contains(&ResourceType::Fetch));
    }

    #[test]
    fn first_painted_row_replaces_the_height_estimate() {
        let mut app = App::new(Box::new(NullSource), AppOptions::default(), 0);
        app.resize(20, 90);
        app.render();
        assert!(!app.panels.list.virtual_list().is_measured());

        for i in 0..3 {
            app.store.upsert_request(Request::new(i.to_string(), format!("https://a.test/{i}"), "GET"));
        }
        app.store.flush();
        app.render();
        let list = app.panels.list.virtual_list();
        assert!(list.is_measured());
        assert_eq!(list.row_height(), 1);
    }

    #[test]
    fn render_fills_the_frame() {
        let mut app = App::new(Box::new(NullSource), AppOptions::default(), 0);
        app.resize(20, 90);
        let frame = app.render();
        assert!(frame.contains("netmodal"));
        assert!(frame.contains("No requests captured yet"));
    }
}
