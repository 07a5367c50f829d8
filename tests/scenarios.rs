//! End-to-end scenarios driving the public `App` API with a scripted capture
//! source and explicit clock values.

use netmodal::app::{Action, App, AppOptions, BareKey, Key, Mode, Pane};
use netmodal::capture::{CaptureError, CaptureEvent, CaptureSource};
use netmodal::domain::ResponseBody;
use netmodal::store::{CaptureStatus, MAX_REQUESTS};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

/// Capture source fed by the test. `enable` answers with a successful
/// attach; every command is recorded.
#[derive(Default, Clone)]
struct ScriptedSource {
    queue: Rc<RefCell<VecDeque<CaptureEvent>>>,
    log: Rc<RefCell<Vec<String>>>,
}

impl ScriptedSource {
    fn push(&self, event: CaptureEvent) {
        self.queue.borrow_mut().push_back(event);
    }

    fn commands(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl CaptureSource for ScriptedSource {
    fn enable(&mut self) -> Result<(), CaptureError> {
        self.log.borrow_mut().push("enable".into());
        self.push(CaptureEvent::AttachResult { error: None });
        Ok(())
    }

    fn request_body(&mut self, request_id: &str) -> Result<(), CaptureError> {
        self.log.borrow_mut().push(format!("body:{request_id}"));
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<CaptureEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }
}

fn initiated(id: &str, frame: &str, navigation: bool) -> CaptureEvent {
    CaptureEvent::Initiated {
        request_id: id.into(),
        timestamp: 100.0,
        url: format!("https://shop.test/api/{id}"),
        method: "GET".into(),
        resource_type: if navigation { "Document" } else { "Fetch" }.into(),
        request_headers: Default::default(),
        request_body: None,
        frame_id: Some(frame.into()),
        is_navigation: navigation,
    }
}

fn response(id: &str, status: u16) -> CaptureEvent {
    CaptureEvent::ResponseHeaders {
        request_id: id.into(),
        timestamp: 100.1,
        status,
        status_text: if status == 404 { "Not Found" } else { "OK" }.into(),
        headers: [("content-type".to_string(), "application/json".to_string())].into(),
        mime_type: Some("application/json".into()),
    }
}

fn finished(id: &str) -> CaptureEvent {
    CaptureEvent::Finished {
        request_id: id.into(),
        timestamp: 100.25,
        encoded_data_length: 512,
    }
}

fn body(id: &str, text: &str) -> CaptureEvent {
    CaptureEvent::BodyResult {
        request_id: id.into(),
        body: Some(ResponseBody {
            text: text.into(),
            base64_encoded: false,
        }),
        error: None,
    }
}

fn started() -> (App, ScriptedSource) {
    let source = ScriptedSource::default();
    let mut app = App::new(Box::new(source.clone()), AppOptions::default(), 0);
    app.resize(30, 120);
    app.start();
    app.tick(0);
    (app, source)
}

/// An attached app holding `n` completed requests with ids `0..n`.
fn with_requests(n: usize) -> (App, ScriptedSource) {
    let (mut app, source) = started();
    for i in 0..n {
        let id = i.to_string();
        source.push(initiated(&id, "main", false));
        source.push(response(&id, 200));
        source.push(finished(&id));
    }
    app.tick(1);
    (app, source)
}

fn ids(app: &App) -> Vec<String> {
    app.state().requests.iter().map(|r| r.id.clone()).collect()
}

#[test]
fn attach_succeeds_on_start() {
    let (app, source) = started();
    assert_eq!(app.state().capture, CaptureStatus::Active);
    assert_eq!(source.commands(), ["enable"]);
}

#[test]
fn lifecycle_events_update_only_their_request() {
    let (mut app, source) = started();
    for id in ["a", "b", "c"] {
        source.push(initiated(id, "main", false));
    }
    app.tick(10);
    let before = app.state();

    source.push(response("b", 404));
    app.tick(20);
    let state = app.state();

    assert_eq!(ids(&app), ["a", "b", "c"]);
    assert_eq!(state.requests[1].status, 404);
    assert_eq!(state.requests[1].status_text, "Not Found");
    assert_eq!(state.requests[0].status, 0);
    assert_eq!(state.requests[2].status, 0);
    assert!(Arc::ptr_eq(&before.requests[0], &state.requests[0]));
    assert!(Arc::ptr_eq(&before.requests[2], &state.requests[2]));
    assert!(!Arc::ptr_eq(&before.requests[1], &state.requests[1]));
}

#[test]
fn gg_completes_only_within_the_prefix_timeout() {
    let (mut app, _) = with_requests(5);

    app.handle_key(Key::char('G'), 100);
    assert_eq!(app.state().selected_index, 4);

    app.handle_key(Key::char('g'), 1_000);
    app.handle_key(Key::char('g'), 1_500);
    assert_eq!(app.state().selected_index, 0);

    app.handle_key(Key::char('G'), 2_000);
    app.handle_key(Key::char('g'), 3_000);
    app.handle_key(Key::char('g'), 4_100);
    assert_eq!(app.state().selected_index, 4);
}

#[test]
fn body_fetches_for_the_same_request_are_coalesced() {
    let (mut app, source) = with_requests(1);
    // The preview asks for the body of the selected request.
    assert_eq!(source.commands(), ["enable", "body:0"]);

    app.handle_key(Key::char('c'), 100);
    assert_eq!(app.state().mode, Mode::Copy);
    let actions = app.handle_key(Key::char('r'), 200);
    assert!(actions.is_empty());
    assert_eq!(app.state().mode, Mode::Normal);
    assert_eq!(source.commands(), ["enable", "body:0"]);

    source.push(body("0", "{\"ok\":true}"));
    let actions = app.tick(300);
    assert_eq!(
        actions,
        [Action::Copy {
            label: "Response body".into(),
            text: "{\"ok\":true}".into(),
        }]
    );
    assert!(app.state().requests[0].response_body.is_some());
}

#[test]
fn only_main_frame_navigation_clears_the_list() {
    let (mut app, source) = started();
    source.push(initiated("doc", "main", true));
    source.push(initiated("xhr", "main", false));
    source.push(initiated("iframe-doc", "child", true));
    app.tick(10);
    assert_eq!(ids(&app), ["doc", "xhr", "iframe-doc"]);

    source.push(initiated("next-doc", "main", true));
    app.tick(20);
    assert_eq!(ids(&app), ["next-doc"]);
}

#[test]
fn request_list_is_capped_with_oldest_evicted_first() {
    let (mut app, source) = started();
    for i in 0..MAX_REQUESTS + 5 {
        source.push(initiated(&format!("r{i}"), "main", false));
    }
    app.tick(10);

    let ids = ids(&app);
    assert_eq!(ids.len(), MAX_REQUESTS);
    assert_eq!(ids[0], "r5");
    assert_eq!(ids[MAX_REQUESTS - 1], format!("r{}", MAX_REQUESTS + 4));
}

#[test]
fn every_key_is_handled_in_every_mode() {
    let keys: Vec<Key> = "jkgGdyhlHLPwnNaR123/fcq uJ"
        .chars()
        .map(Key::char)
        .chain(
            [
                BareKey::Enter,
                BareKey::Esc,
                BareKey::Tab,
                BareKey::BackTab,
                BareKey::Backspace,
                BareKey::Up,
                BareKey::Down,
                BareKey::Left,
                BareKey::Right,
                BareKey::PageUp,
                BareKey::PageDown,
            ]
            .map(Key::from),
        )
        .chain([Key::ctrl('d'), Key::ctrl('u')])
        .collect();

    let entries: [(&[Key], Mode); 5] = [
        (&[], Mode::Normal),
        (&[Key::char('/')], Mode::Search),
        (&[Key::char('f')], Mode::Filter),
        (&[Key::new(BareKey::Enter)], Mode::Inspect),
        (&[Key::char('c')], Mode::Copy),
    ];

    for (entry, mode) in entries {
        for &key in &keys {
            let (mut app, _) = with_requests(3);
            let mut now = 10;
            for &k in entry {
                app.handle_key(k, now);
                now += 10;
            }
            assert_eq!(app.state().mode, mode);

            app.handle_key(key, now);
            app.tick(now + 5_000);

            let state = app.state();
            assert!(state.selected_index < state.requests.len().max(1), "{mode:?} {key:?}");
            assert!(state.filter_cursor < state.filter.order.len(), "{mode:?} {key:?}");
            app.render();
        }
    }
}

#[test]
fn preview_nodes_collapse_and_expand_in_place() {
    let (mut app, source) = with_requests(1);
    source.push(body("0", r#"{"a":{"b":1},"c":[1,2]}"#));
    app.tick(10);

    app.handle_key(Key::new(BareKey::Enter), 20);
    app.handle_key(Key::char('P'), 30);
    let state = app.state();
    assert_eq!(state.mode, Mode::Inspect);
    assert_eq!(state.inspect.focus, Pane::Preview);
    let paths: Vec<&str> = state.json_nodes.iter().map(|n| n.path.as_str()).collect();
    assert_eq!(paths, ["a", "a.b", "c", "c[0]", "c[1]"]);

    app.handle_key(Key::char(' '), 40);
    let paths: Vec<String> = app.state().json_nodes.iter().map(|n| n.path.clone()).collect();
    assert_eq!(paths, ["a", "c", "c[0]", "c[1]"]);

    app.handle_key(Key::char(' '), 50);
    assert_eq!(app.state().json_nodes.len(), 5);
}

#[test]
fn idle_ticks_keep_the_snapshot() {
    let (mut app, _) = with_requests(3);
    let before = app.state();
    app.tick(50);
    assert!(Arc::ptr_eq(&before, &app.state()));

    let view = app.store_mut().filtered_view();
    app.handle_key(Key::char('j'), 60);
    assert_eq!(app.state().selected_index, 1);
    assert!(Arc::ptr_eq(&view, &app.store_mut().filtered_view()));
}

#[test]
fn status_messages_clear_themselves() {
    let (mut app, _) = started();
    assert!(app.state().status.is_some());
    app.tick(2_999);
    assert!(app.state().status.is_some());
    app.tick(3_000);
    assert!(app.state().status.is_none());
}

#[test]
fn a_burst_of_events_notifies_once_per_tick() {
    let (mut app, source) = with_requests(0);
    for i in 0..6 {
        let id = format!("burst{i}");
        source.push(initiated(&id, "main", false));
    }
    app.tick(10);

    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    app.subscribe(move |_| counter.set(counter.get() + 1));

    for i in 0..6 {
        let id = format!("burst{i}");
        if i % 2 == 0 {
            source.push(finished(&id));
        } else {
            source.push(CaptureEvent::Failed {
                request_id: id,
                timestamp: 100.3,
                error_text: "net::ERR_ABORTED".into(),
            });
        }
    }
    app.tick(20);

    assert_eq!(calls.get(), 1);
    let state = app.state();
    assert_eq!(state.requests.iter().filter(|r| r.failed).count(), 3);
    assert_eq!(state.requests.iter().filter(|r| r.transferred_size == 512).count(), 3);

    app.tick(30);
    assert_eq!(calls.get(), 1);
}

#[test]
fn preview_yanks_copy_node_value_and_path() {
    let (mut app, source) = with_requests(1);
    source.push(body("0", r#"{"a":{"b":1},"c":[1,2]}"#));
    app.tick(10);

    app.handle_key(Key::new(BareKey::Enter), 20);
    app.handle_key(Key::char('P'), 30);
    app.handle_key(Key::char('j'), 40);

    app.handle_key(Key::char('y'), 50);
    let actions = app.handle_key(Key::char('y'), 60);
    assert_eq!(
        actions,
        [Action::Copy {
            label: "Value".into(),
            text: "1".into(),
        }]
    );

    app.handle_key(Key::char('y'), 70);
    let actions = app.handle_key(Key::char('p'), 80);
    assert_eq!(
        actions,
        [Action::Copy {
            label: "Path".into(),
            text: "a.b".into(),
        }]
    );
}

#[test]
fn q_in_search_is_query_text_and_the_footer_says_so() {
    let (mut app, _) = with_requests(2);
    app.handle_key(Key::char('/'), 10);
    let actions = app.handle_key(Key::char('q'), 20);
    assert!(actions.is_empty());

    let state = app.state();
    assert_eq!(state.mode, Mode::Search);
    assert_eq!(state.search_query, "q");
    assert!(app.render().contains("(q is text)"));

    app.handle_key(Key::new(BareKey::Enter), 30);
    assert_eq!(app.state().mode, Mode::Normal);
    assert_eq!(app.state().search_query, "q");
}
