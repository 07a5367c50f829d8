//! Copy formatting.
//!
//! [`CopyFormatter`] is the collaborator the interpreter hands copy intents
//! to. It only produces text; putting it on a clipboard is the host's job.

use super::actions::Action;
use super::modes::CopyTarget;
use super::scheduler::Scheduler;
use crate::domain::{Headers, Request, ResponseBody};
use crate::store::{StatusClass, Store};
use base64::Engine as _;
use serde_json::{json, Value};

/// Formats request-level copy targets.
pub trait CopyFormatter {
    /// Text for `target`, or `None` when there is nothing to copy (for
    /// instance a body target without a body).
    fn format(&self, target: &CopyTarget, request: &Request, body: Option<&ResponseBody>) -> Option<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCopyFormatter;

impl CopyFormatter for DefaultCopyFormatter {
    fn format(&self, target: &CopyTarget, request: &Request, body: Option<&ResponseBody>) -> Option<String> {
        match target {
            CopyTarget::Url => Some(request.url.clone()),
            CopyTarget::ResponseBody => body.map(body_text),
            CopyTarget::RequestHeaders => Some(header_block(&request.request_headers)),
            CopyTarget::ResponseHeaders => Some(header_block(&request.response_headers)),
            CopyTarget::Curl => Some(curl_command(request)),
            CopyTarget::Json => serde_json::to_string_pretty(&request_json(request, body)).ok(),
            CopyTarget::HeaderValue { name, value, with_name } => Some(if *with_name {
                format!("{name}: {value}")
            } else {
                value.clone()
            }),
            CopyTarget::NodePath { path } => Some(path.clone()),
            CopyTarget::NodeValue { pointer } => body.and_then(|body| node_value(body, pointer)),
        }
    }
}

/// Body as text, decoding base64 bodies when they are valid UTF-8.
#[must_use]
pub fn body_text(body: &ResponseBody) -> String {
    decoded_text(body).unwrap_or_else(|| body.text.clone())
}

/// The decoded text of a base64 body; `None` for plain or binary bodies.
fn decoded_text(body: &ResponseBody) -> Option<String> {
    if !body.base64_encoded {
        return None;
    }
    base64::engine::general_purpose::STANDARD
        .decode(body.text.as_bytes())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
}

/// Raw value at `pointer` inside a JSON body.
fn node_value(body: &ResponseBody, pointer: &str) -> Option<String> {
    let root: Value = serde_json::from_str(&body_text(body)).ok()?;
    root.pointer(pointer).map(value_text)
}

/// `Name: value` lines, sorted by name.
#[must_use]
pub fn header_block(headers: &Headers) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of a JSON value as the user expects to paste it: strings unquoted,
/// containers pretty-printed.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}

fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// A `curl` command line reproducing the request.
#[must_use]
pub fn curl_command(request: &Request) -> String {
    let mut parts = vec!["curl".to_string()];
    if request.method != "GET" {
        parts.push(format!("-X {}", request.method));
    }
    parts.push(shell_quote(&request.url));
    for (name, value) in &request.request_headers {
        parts.push(format!("-H {}", shell_quote(&format!("{name}: {value}"))));
    }
    if let Some(body) = &request.request_body {
        parts.push(format!("--data-raw {}", shell_quote(body)));
    }
    parts.join(" \\\n  ")
}

fn request_json(request: &Request, body: Option<&ResponseBody>) -> Value {
    let mut value = serde_json::to_value(request).unwrap_or(Value::Null);
    if let (Value::Object(map), Some(body)) = (&mut value, body) {
        let (text, base64_encoded) = match decoded_text(body) {
            Some(text) => (text, false),
            None => (body.text.clone(), body.base64_encoded),
        };
        map.insert(
            "responseBody".to_string(),
            json!({ "text": text, "base64Encoded": base64_encoded }),
        );
    }
    value
}

/// Builds the clipboard action for `text` and reports it on the status line.
pub fn copy_action(store: &mut Store, scheduler: &mut Scheduler, label: &str, text: String) -> Action {
    tracing::debug!(label, bytes = text.len(), "copy");
    store.post_status(scheduler, StatusClass::Success, format!("Copied {}", label.to_lowercase()));
    Action::Copy {
        label: label.to_string(),
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Request {
        let mut request = Request::new("1", "https://api.test/v1/users?page=2", "POST");
        request
            .request_headers
            .insert("content-type".into(), "application/json".into());
        request.request_body = Some(r#"{"name":"O'Brien"}"#.into());
        request
    }

    #[test]
    fn curl_quotes_and_includes_body() {
        let text = curl_command(&sample());
        assert!(text.starts_with("curl \\\n  -X POST"));
        assert!(text.contains("-H 'content-type: application/json'"));
        assert!(text.contains(r#"--data-raw '{"name":"O'\''Brien"}'"#));
    }

    #[test]
    fn body_target_without_body_is_none() {
        let formatter = DefaultCopyFormatter;
        assert_eq!(formatter.format(&CopyTarget::ResponseBody, &sample(), None), None);
        let body = ResponseBody {
            text: "aGVsbG8=".into(),
            base64_encoded: true,
        };
        assert_eq!(
            formatter.format(&CopyTarget::ResponseBody, &sample(), Some(&body)),
            Some("hello".into())
        );
    }

    #[test]
    fn header_value_with_and_without_name() {
        let formatter = DefaultCopyFormatter;
        let target = |with_name| CopyTarget::HeaderValue {
            name: "accept".into(),
            value: "*/*".into(),
            with_name,
        };
        assert_eq!(formatter.format(&target(true), &sample(), None), Some("accept: */*".into()));
        assert_eq!(formatter.format(&target(false), &sample(), None), Some("*/*".into()));
    }

    #[test]
    fn json_export_embeds_body() {
        let body = ResponseBody {
            text: "[1]".into(),
            base64_encoded: false,
        };
        let text = DefaultCopyFormatter
            .format(&CopyTarget::Json, &sample(), Some(&body))
            .unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["method"], "POST");
        assert_eq!(value["responseBody"]["text"], "[1]");
    }

    #[test]
    fn json_export_keeps_binary_bodies_encoded() {
        let binary = ResponseBody {
            text: "/w==".into(),
            base64_encoded: true,
        };
        let text = DefaultCopyFormatter
            .format(&CopyTarget::Json, &sample(), Some(&binary))
            .unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["responseBody"]["text"], "/w==");
        assert_eq!(value["responseBody"]["base64Encoded"], true);

        let utf8 = ResponseBody {
            text: "aGVsbG8=".into(),
            base64_encoded: true,
        };
        let text = DefaultCopyFormatter
            .format(&CopyTarget::Json, &sample(), Some(&utf8))
            .unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["responseBody"]["text"], "hello");
        assert_eq!(value["responseBody"]["base64Encoded"], false);
    }

    #[test]
    fn node_value_resolves_its_pointer() {
        let body = ResponseBody {
            text: r#"{"user":{"name":"ada","tags":["a"]}}"#.into(),
            base64_encoded: false,
        };
        let target = |pointer: &str| CopyTarget::NodeValue {
            pointer: pointer.into(),
        };
        let formatter = DefaultCopyFormatter;
        assert_eq!(formatter.format(&target("/user/name"), &sample(), Some(&body)), Some("ada".into()));
        assert_eq!(
            formatter.format(&target("/user/tags"), &sample(), Some(&body)),
            Some("[\n  \"a\"\n]".into())
        );
        assert_eq!(formatter.format(&target("/missing"), &sample(), Some(&body)), None);
        assert_eq!(formatter.format(&target("/user/name"), &sample(), None), None);
    }

    #[test]
    fn value_text_unquotes_strings() {
        assert_eq!(value_text(&json!("x")), "x");
        assert_eq!(value_text(&json!(3)), "3");
        assert_eq!(value_text(&json!(null)), "null");
    }
}
