//! Request reconciliation.
//!
//! The [`Reconciler`] turns the capture source's lifecycle events, which may
//! arrive late, duplicated or racing each other, into request records in the
//! [`Store`]. It also owns the attach state machine (retry with backoff,
//! reattach after detach) and the per-id coalescing of body fetches.
//!
//! Nothing in here returns an error to its caller: failures become status
//! messages on the store.

use super::error::CaptureError;
use super::events::CaptureEvent;
use super::retry::RetryPolicy;
use super::source::CaptureSource;
use crate::app::scheduler::{Scheduler, Timer};
use crate::domain::{Request, ResourceType, ResponseBody};
use crate::store::{CaptureStatus, StatePatch, StatusClass, Store};
use std::collections::HashMap;
use std::sync::Arc;

/// Delay between a detach and the automatic reattach attempt.
pub const REATTACH_DELAY_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttachState {
    Idle,
    /// An `enable` is in flight for this 0-indexed attempt.
    Attaching { attempt: u32 },
    /// Waiting for the retry timer before `attempt`.
    Backoff { attempt: u32 },
    Active,
    Failed,
}

/// Outcome of [`Reconciler::fetch_body`].
#[derive(Debug, Clone, PartialEq)]
pub enum BodyFetch {
    /// Answered immediately; `None` when the body is unavailable.
    Ready(Option<Arc<ResponseBody>>),
    /// The waiter will be returned by `handle_event` once the body arrives.
    Pending,
}

/// A body fetch resolved for a waiter registered earlier.
pub type BodyDelivery<W> = (W, Option<Arc<ResponseBody>>);

/// Event reconciler, generic over the token callers use to identify who is
/// waiting for a body.
pub struct Reconciler<W> {
    source: Box<dyn CaptureSource>,
    policy: RetryPolicy,
    attach: AttachState,
    main_frame: Option<String>,
    bodies: HashMap<String, Arc<ResponseBody>>,
    in_flight: HashMap<String, Vec<W>>,
}

impl<W> std::fmt::Debug for Reconciler<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("attach", &self.attach)
            .field("main_frame", &self.main_frame)
            .field("cached_bodies", &self.bodies.len())
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl<W> Reconciler<W> {
    pub fn new(source: Box<dyn CaptureSource>, policy: RetryPolicy) -> Self {
        Self {
            source,
            policy,
            attach: AttachState::Idle,
            main_frame: None,
            bodies: HashMap::new(),
            in_flight: HashMap::new(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.attach == AttachState::Active
    }

    #[must_use]
    pub fn main_frame(&self) -> Option<&str> {
        self.main_frame.as_deref()
    }

    /// Number of ids with a body fetch in flight.
    #[must_use]
    pub fn fetches_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Drains the source's pending events.
    pub fn poll_source(&mut self) -> Vec<CaptureEvent> {
        self.source.poll_events()
    }

    /// Starts attaching unless already attached or an attempt is in flight.
    pub fn ensure_capture_active(&mut self, store: &mut Store, scheduler: &mut Scheduler) {
        match self.attach {
            AttachState::Active | AttachState::Attaching { .. } | AttachState::Backoff { .. } => {
                tracing::trace!(state = ?self.attach, "ensure_capture_active: nothing to do");
            }
            AttachState::Idle | AttachState::Failed => self.start_attempt(0, store, scheduler),
        }
    }

    fn start_attempt(&mut self, attempt: u32, store: &mut Store, scheduler: &mut Scheduler) {
        tracing::debug!(attempt, "attaching to capture source");
        self.attach = AttachState::Attaching { attempt };
        store.set_state(StatePatch {
            capture: Some(CaptureStatus::Attaching { attempt: attempt + 1 }),
            ..StatePatch::default()
        });
        if let Err(e) = self.source.enable() {
            self.attach_failed(attempt, e, store, scheduler);
        }
    }

    fn attach_succeeded(&mut self, store: &mut Store, scheduler: &mut Scheduler) {
        tracing::info!("capture active");
        self.attach = AttachState::Active;
        store.set_state(StatePatch {
            capture: Some(CaptureStatus::Active),
            ..StatePatch::default()
        });
        store.resolve_error();
        store.post_status(scheduler, StatusClass::Success, "Capturing network requests");
    }

    fn attach_failed(&mut self, attempt: u32, err: CaptureError, store: &mut Store, scheduler: &mut Scheduler) {
        if err == CaptureError::AlreadyActive {
            self.attach_succeeded(store, scheduler);
            return;
        }

        if err.is_retryable() {
            if let Some(delay) = self.policy.next_delay(attempt) {
                tracing::warn!(attempt, delay, error = %err, "attach failed, retrying");
                self.attach = AttachState::Backoff { attempt: attempt + 1 };
                scheduler.schedule(delay, Timer::AttachRetry);
                return;
            }
            tracing::error!(attempts = attempt + 1, error = %err, "attach retries exhausted");
            self.fail(
                format!("Capture unavailable after {} attempts: {err}", attempt + 1),
                store,
                scheduler,
            );
            return;
        }

        tracing::error!(error = %err, "attach failed permanently");
        self.fail(err.guidance(), store, scheduler);
    }

    fn fail(&mut self, text: String, store: &mut Store, scheduler: &mut Scheduler) {
        self.attach = AttachState::Failed;
        store.set_state(StatePatch {
            capture: Some(CaptureStatus::Failed),
            ..StatePatch::default()
        });
        store.post_status(scheduler, StatusClass::Error, text);
    }

    /// Handles a scheduler timer owned by the reconciler.
    pub fn on_timer(&mut self, timer: Timer, store: &mut Store, scheduler: &mut Scheduler) {
        match (timer, self.attach) {
            (Timer::AttachRetry, AttachState::Backoff { attempt }) => {
                self.start_attempt(attempt, store, scheduler);
            }
            (Timer::Reattach, AttachState::Idle) => self.ensure_capture_active(store, scheduler),
            (timer, state) => tracing::trace!(?timer, ?state, "stale capture timer ignored"),
        }
    }

    /// Applies one capture event.
    ///
    /// Returns the body waiters resolved by this event.
    pub fn handle_event(
        &mut self,
        event: CaptureEvent,
        store: &mut Store,
        scheduler: &mut Scheduler,
    ) -> Vec<BodyDelivery<W>> {
        let _span = tracing::debug_span!("reconcile", kind = event.kind(), id = event.request_id()).entered();

        match event {
            CaptureEvent::Initiated {
                request_id,
                timestamp,
                url,
                method,
                resource_type,
                request_headers,
                request_body,
                frame_id,
                is_navigation,
            } => {
                if is_navigation && self.is_main_frame(frame_id.as_deref()) {
                    tracing::debug!(frame = ?frame_id, "main frame navigation, resetting");
                    self.reset(store);
                    self.main_frame.clone_from(&frame_id);
                }

                let mut request = Request::new(request_id, url, method);
                request.resource_type = ResourceType::parse(&resource_type);
                request.timestamp_start = timestamp;
                request.request_headers = request_headers;
                request.request_body = request_body;
                request.frame_id = frame_id;
                // A repeated id is a new response (redirect); its old body is stale.
                let cached = self.bodies.remove(&request.id).is_some();
                let waiting = self.in_flight.remove(&request.id).is_some();
                if cached || waiting {
                    tracing::debug!(request_id = %request.id, "request restarted, cached body dropped");
                }
                for evicted in store.upsert_request(request) {
                    self.bodies.remove(&evicted);
                    self.in_flight.remove(&evicted);
                }
            }

            CaptureEvent::ResponseHeaders {
                request_id,
                status,
                status_text,
                headers,
                mime_type,
                ..
            } => {
                let found = store.update_request(&request_id, |r| {
                    r.status = status;
                    r.status_text = status_text;
                    r.response_headers = headers;
                    r.mime_type = mime_type;
                });
                if !found {
                    tracing::trace!(%request_id, "headers for untracked request ignored");
                }
            }

            CaptureEvent::Finished {
                request_id,
                timestamp,
                encoded_data_length,
            } => {
                store.update_request(&request_id, |r| {
                    r.transferred_size = encoded_data_length;
                    r.duration = elapsed_ms(r.timestamp_start, timestamp);
                });
            }

            CaptureEvent::Failed {
                request_id,
                timestamp,
                error_text,
            } => {
                store.update_request(&request_id, |r| {
                    r.status_text = error_text;
                    r.failed = true;
                    r.duration = elapsed_ms(r.timestamp_start, timestamp);
                });
            }

            CaptureEvent::AttachResult { error } => {
                let AttachState::Attaching { attempt } = self.attach else {
                    tracing::debug!(state = ?self.attach, "unexpected attach result ignored");
                    return Vec::new();
                };
                match error {
                    None => self.attach_succeeded(store, scheduler),
                    Some(wire) => self.attach_failed(attempt, wire.into(), store, scheduler),
                }
            }

            CaptureEvent::Detached { reason } => {
                tracing::warn!(reason = ?reason, "capture source detached");
                self.reset(store);
                self.main_frame = None;
                self.attach = AttachState::Idle;
                store.set_state(StatePatch {
                    capture: Some(CaptureStatus::Inactive),
                    ..StatePatch::default()
                });
                store.post_status(scheduler, StatusClass::Info, "Capture detached, reattaching");
                scheduler.schedule(REATTACH_DELAY_MS, Timer::Reattach);
            }

            CaptureEvent::BodyResult {
                request_id,
                body,
                error,
            } => return self.resolve_body(&request_id, body, error, store),
        }
        Vec::new()
    }

    fn is_main_frame(&self, frame_id: Option<&str>) -> bool {
        match &self.main_frame {
            None => true,
            Some(main) => frame_id == Some(main.as_str()),
        }
    }

    /// Clears requests and every body cache. In-flight waiters are dropped;
    /// their results are ignored when they arrive.
    fn reset(&mut self, store: &mut Store) {
        if !self.in_flight.is_empty() {
            tracing::debug!(dropped = self.in_flight.len(), "dropping in-flight body fetches");
        }
        self.bodies.clear();
        self.in_flight.clear();
        store.clear_requests();
    }

    /// Forgets the cached body of a request the user deleted.
    pub fn forget(&mut self, request_id: &str) {
        self.bodies.remove(request_id);
    }

    /// Forgets every cached body (user cleared the list).
    pub fn forget_all(&mut self) {
        self.bodies.clear();
    }

    /// Returns the body of `request_id`, or registers `waiter` for it.
    ///
    /// A fetch already in flight for the same id is joined rather than
    /// repeated. Failed fetches are not cached, so a later call retries.
    pub fn fetch_body(&mut self, request_id: &str, waiter: W, store: &Store) -> BodyFetch {
        if let Some(body) = self.bodies.get(request_id) {
            return BodyFetch::Ready(Some(Arc::clone(body)));
        }
        if let Some(waiters) = self.in_flight.get_mut(request_id) {
            tracing::trace!(%request_id, waiters = waiters.len() + 1, "joining in-flight body fetch");
            waiters.push(waiter);
            return BodyFetch::Pending;
        }

        let live = store.pending().requests.iter().find(|r| r.id == request_id);
        match live {
            None => return BodyFetch::Ready(None),
            Some(request) => {
                if let Some(body) = &request.response_body {
                    self.bodies.insert(request_id.to_string(), Arc::clone(body));
                    return BodyFetch::Ready(Some(Arc::clone(body)));
                }
            }
        }

        match self.source.request_body(request_id) {
            Ok(()) => {
                tracing::debug!(%request_id, "body fetch issued");
                self.in_flight.insert(request_id.to_string(), vec![waiter]);
                BodyFetch::Pending
            }
            Err(e) => {
                tracing::warn!(%request_id, error = %e, "body fetch could not be sent");
                BodyFetch::Ready(None)
            }
        }
    }

    fn resolve_body(
        &mut self,
        request_id: &str,
        body: Option<ResponseBody>,
        error: Option<String>,
        store: &mut Store,
    ) -> Vec<BodyDelivery<W>> {
        let Some(waiters) = self.in_flight.remove(request_id) else {
            tracing::debug!(%request_id, "late body result dropped");
            return Vec::new();
        };

        let resolved = match body {
            Some(body) => {
                let body = Arc::new(body);
                self.bodies.insert(request_id.to_string(), Arc::clone(&body));
                store.update_request(request_id, |r| r.response_body = Some(Arc::clone(&body)));
                Some(body)
            }
            None => {
                tracing::warn!(%request_id, error = ?error, "body fetch failed");
                None
            }
        };

        waiters
            .into_iter()
            .map(|waiter| (waiter, resolved.clone()))
            .collect()
    }
}

fn elapsed_ms(start_s: f64, end_s: f64) -> f64 {
    ((end_s - start_s) * 1_000.0).max(0.0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::capture::error::{ErrorCode, WireError};
    use crate::store::MAX_REQUESTS;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every command sent to it; events are pushed by the test.
    #[derive(Default)]
    pub(crate) struct ScriptedSource {
        pub log: Rc<RefCell<Vec<String>>>,
        pub fail_enable: Option<CaptureError>,
    }

    impl CaptureSource for ScriptedSource {
        fn enable(&mut self) -> Result<(), CaptureError> {
            self.log.borrow_mut().push("enable".into());
            match &self.fail_enable {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }

        fn request_body(&mut self, request_id: &str) -> Result<(), CaptureError> {
            self.log.borrow_mut().push(format!("body:{request_id}"));
            Ok(())
        }

        fn poll_events(&mut self) -> Vec<CaptureEvent> {
            Vec::new()
        }
    }

    fn setup() -> (Reconciler<u32>, Store, Scheduler, Rc<RefCell<Vec<String>>>) {
        let source = ScriptedSource::default();
        let log = Rc::clone(&source.log);
        (
            Reconciler::new(Box::new(source), RetryPolicy::default()),
            Store::default(),
            Scheduler::new(0),
            log,
        )
    }

    fn initiated(id: &str, frame: &str, navigation: bool) -> CaptureEvent {
        CaptureEvent::Initiated {
            request_id: id.into(),
            timestamp: 10.0,
            url: format!("https://a.test/{id}"),
            method: "GET".into(),
            resource_type: if navigation { "Document" } else { "XHR" }.into(),
            request_headers: Default::default(),
            request_body: None,
            frame_id: Some(frame.into()),
            is_navigation: navigation,
        }
    }

    #[test]
    fn headers_update_only_matching_request() {
        let (mut rec, mut store, mut sched, _) = setup();
        for id in ["a", "b", "c"] {
            rec.handle_event(initiated(id, "main", false), &mut store, &mut sched);
        }
        rec.handle_event(
            CaptureEvent::ResponseHeaders {
                request_id: "b".into(),
                timestamp: 10.2,
                status: 404,
                status_text: "Not Found".into(),
                headers: Default::default(),
                mime_type: None,
            },
            &mut store,
            &mut sched,
        );
        rec.handle_event(
            CaptureEvent::ResponseHeaders {
                request_id: "gone".into(),
                timestamp: 10.2,
                status: 200,
                status_text: String::new(),
                headers: Default::default(),
                mime_type: None,
            },
            &mut store,
            &mut sched,
        );
        store.flush();

        let state = store.get_state();
        let statuses: Vec<u16> = state.requests.iter().map(|r| r.status).collect();
        assert_eq!(statuses, [0, 404, 0]);
    }

    #[test]
    fn finish_and_fail_both_set_duration() {
        let (mut rec, mut store, mut sched, _) = setup();
        rec.handle_event(initiated("x", "main", false), &mut store, &mut sched);
        rec.handle_event(
            CaptureEvent::Finished {
                request_id: "x".into(),
                timestamp: 10.25,
                encoded_data_length: 512,
            },
            &mut store,
            &mut sched,
        );
        rec.handle_event(
            CaptureEvent::Failed {
                request_id: "x".into(),
                timestamp: 10.5,
                error_text: "net::ERR_ABORTED".into(),
            },
            &mut store,
            &mut sched,
        );
        store.flush();
        let state = store.get_state();
        let request = &state.requests[0];
        assert_eq!(request.transferred_size, 512);
        assert!((request.duration - 500.0).abs() < 1e-6);
        assert_eq!(request.status_text, "net::ERR_ABORTED");
        assert!(request.failed);
    }

    #[test]
    fn coalesced_body_fetch() {
        let (mut rec, mut store, mut sched, log) = setup();
        rec.handle_event(initiated("x", "main", false), &mut store, &mut sched);

        assert_eq!(rec.fetch_body("x", 1, &store), BodyFetch::Pending);
        assert_eq!(rec.fetch_body("x", 2, &store), BodyFetch::Pending);
        assert_eq!(log.borrow().iter().filter(|l| *l == "body:x").count(), 1);

        let delivered = rec.handle_event(
            CaptureEvent::BodyResult {
                request_id: "x".into(),
                body: Some(ResponseBody {
                    text: "{}".into(),
                    base64_encoded: false,
                }),
                error: None,
            },
            &mut store,
            &mut sched,
        );
        assert_eq!(delivered.len(), 2);
        let (first, second) = (&delivered[0].1, &delivered[1].1);
        assert!(matches!((first, second), (Some(a), Some(b)) if Arc::ptr_eq(a, b)));

        assert!(matches!(rec.fetch_body("x", 3, &store), BodyFetch::Ready(Some(_))));
        assert_eq!(log.borrow().iter().filter(|l| *l == "body:x").count(), 1);
    }

    #[test]
    fn failed_body_fetch_is_retryable() {
        let (mut rec, mut store, mut sched, log) = setup();
        rec.handle_event(initiated("x", "main", false), &mut store, &mut sched);
        rec.fetch_body("x", 1, &store);
        let delivered = rec.handle_event(
            CaptureEvent::BodyResult {
                request_id: "x".into(),
                body: None,
                error: Some("No resource with given identifier".into()),
            },
            &mut store,
            &mut sched,
        );
        assert_eq!(delivered, vec![(1, None)]);
        assert_eq!(rec.fetch_body("x", 2, &store), BodyFetch::Pending);
        assert_eq!(log.borrow().iter().filter(|l| *l == "body:x").count(), 2);
    }

    fn body_result(id: &str, text: &str) -> CaptureEvent {
        CaptureEvent::BodyResult {
            request_id: id.into(),
            body: Some(ResponseBody {
                text: text.into(),
                base64_encoded: false,
            }),
            error: None,
        }
    }

    #[test]
    fn redirect_drops_the_previous_body() {
        let (mut rec, mut store, mut sched, log) = setup();
        rec.handle_event(initiated("x", "main", false), &mut store, &mut sched);
        rec.fetch_body("x", 1, &store);
        rec.handle_event(body_result("x", "moved"), &mut store, &mut sched);

        rec.handle_event(initiated("x", "main", false), &mut store, &mut sched);
        store.flush();
        assert!(store.get_state().requests[0].response_body.is_none());
        assert_eq!(rec.fetch_body("x", 2, &store), BodyFetch::Pending);
        assert_eq!(log.borrow().iter().filter(|l| *l == "body:x").count(), 2);
    }

    #[test]
    fn evicted_requests_leave_the_body_cache() {
        let (mut rec, mut store, mut sched, log) = setup();
        for i in 0..MAX_REQUESTS {
            rec.handle_event(initiated(&i.to_string(), "main", false), &mut store, &mut sched);
        }
        rec.fetch_body("0", 1, &store);
        rec.handle_event(body_result("0", "payload"), &mut store, &mut sched);
        rec.fetch_body("1", 2, &store);
        assert_eq!(rec.fetches_in_flight(), 1);

        rec.handle_event(initiated("new-a", "main", false), &mut store, &mut sched);
        rec.handle_event(initiated("new-b", "main", false), &mut store, &mut sched);
        store.flush();

        assert_eq!(store.get_state().requests[0].id, "2");
        assert_eq!(rec.fetches_in_flight(), 0);
        assert_eq!(rec.fetch_body("0", 3, &store), BodyFetch::Ready(None));
        assert!(format!("{rec:?}").contains("cached_bodies: 0"));
        assert_eq!(log.borrow().iter().filter(|l| *l == "body:0").count(), 1);
    }

    #[test]
    fn main_frame_navigation_resets_but_subframe_does_not() {
        let (mut rec, mut store, mut sched, _) = setup();
        rec.handle_event(initiated("nav1", "main", true), &mut store, &mut sched);
        for i in 0..4 {
            rec.handle_event(initiated(&format!("r{i}"), "main", false), &mut store, &mut sched);
        }
        store.flush();
        assert_eq!(store.get_state().requests.len(), 5);

        rec.handle_event(initiated("frame-doc", "child", true), &mut store, &mut sched);
        store.flush();
        assert_eq!(store.get_state().requests.len(), 6);

        rec.handle_event(initiated("nav2", "main", true), &mut store, &mut sched);
        store.flush();
        let state = store.get_state();
        assert_eq!(state.requests.len(), 1);
        assert_eq!(state.requests[0].id, "nav2");
        assert_eq!(rec.main_frame(), Some("main"));
    }

    #[test]
    fn transient_attach_failures_back_off_then_surface() {
        let source = ScriptedSource {
            fail_enable: Some(CaptureError::Transient("busy".into())),
            ..ScriptedSource::default()
        };
        let log = Rc::clone(&source.log);
        let mut rec: Reconciler<u32> = Reconciler::new(Box::new(source), RetryPolicy::default());
        let mut store = Store::default();
        let mut sched = Scheduler::new(0);

        rec.ensure_capture_active(&mut store, &mut sched);
        rec.ensure_capture_active(&mut store, &mut sched);
        assert_eq!(log.borrow().len(), 1);

        for now in [500, 1_500] {
            for timer in sched.advance(now) {
                rec.on_timer(timer, &mut store, &mut sched);
            }
        }
        assert_eq!(log.borrow().len(), 3);
        store.flush();

        let state = store.get_state();
        assert_eq!(state.capture, CaptureStatus::Failed);
        let status = state.status.clone().unwrap();
        assert_eq!(status.class, StatusClass::Error);
        assert!(status.text.contains("3 attempts"));
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn exclusive_conflict_is_not_retried() {
        let (mut rec, mut store, mut sched, log) = setup();
        rec.ensure_capture_active(&mut store, &mut sched);
        rec.handle_event(
            CaptureEvent::AttachResult {
                error: Some(WireError {
                    code: ErrorCode::ExclusiveConflict,
                    message: String::new(),
                }),
            },
            &mut store,
            &mut sched,
        );
        store.flush();
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(sched.pending(), 0);
        assert_eq!(store.get_state().capture, CaptureStatus::Failed);
    }

    #[test]
    fn already_active_counts_as_attached() {
        let (mut rec, mut store, mut sched, _) = setup();
        rec.ensure_capture_active(&mut store, &mut sched);
        rec.handle_event(
            CaptureEvent::AttachResult {
                error: Some(WireError {
                    code: ErrorCode::AlreadyActive,
                    message: String::new(),
                }),
            },
            &mut store,
            &mut sched,
        );
        assert!(rec.is_active());
    }

    #[test]
    fn detach_resets_and_reattaches() {
        let (mut rec, mut store, mut sched, log) = setup();
        rec.ensure_capture_active(&mut store, &mut sched);
        rec.handle_event(CaptureEvent::AttachResult { error: None }, &mut store, &mut sched);
        rec.handle_event(initiated("a", "main", false), &mut store, &mut sched);
        rec.fetch_body("a", 1, &store);

        rec.handle_event(CaptureEvent::Detached { reason: None }, &mut store, &mut sched);
        store.flush();
        assert!(store.get_state().requests.is_empty());
        assert_eq!(rec.fetches_in_flight(), 0);

        for timer in sched.advance(REATTACH_DELAY_MS) {
            rec.on_timer(timer, &mut store, &mut sched);
        }
        assert_eq!(log.borrow().iter().filter(|l| *l == "enable").count(), 2);
    }
}
