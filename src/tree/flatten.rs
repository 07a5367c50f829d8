//! Lazy flattening of JSON values into navigable rows.

use super::ExpansionMap;
use serde::Serialize;
use serde_json::Value;

/// Kind tag of a node's raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
}

impl ValueKind {
    #[must_use]
    pub const fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
            Value::Null => Self::Null,
        }
    }

    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Object | Self::Array)
    }
}

/// One flattened row of a JSON tree.
///
/// The raw value is not copied into the node; [`JsonNode::value`] resolves it
/// against the root through `pointer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonNode {
    /// Object key, or the array index as a string. Empty for a primitive root.
    pub key: String,
    pub kind: ValueKind,
    /// Scalar rendering for leaves, `{n}` / `[n]` for containers.
    pub preview: String,
    /// Dot/bracket path, e.g. `data.users[0].name`.
    pub path: String,
    /// RFC 6901 pointer to the same value.
    pub pointer: String,
    /// Expansion state for containers; always false for leaves.
    pub expanded: bool,
    pub depth: usize,
    pub child_count: usize,
}

impl JsonNode {
    /// Resolves this node's raw value inside `root`.
    #[must_use]
    pub fn value<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        root.pointer(&self.pointer)
    }
}

enum Entries<'a> {
    Object(serde_json::map::Iter<'a>),
    Array(std::iter::Enumerate<std::slice::Iter<'a, Value>>),
}

struct Frame<'a> {
    entries: Entries<'a>,
    path: String,
    pointer: String,
    depth: usize,
}

/// Iterator returned by [`flatten`].
pub struct Flatten<'a> {
    root: Option<&'a Value>,
    stack: Vec<Frame<'a>>,
    expansion: &'a ExpansionMap,
}

/// Flattens `value` into rows, honoring `expansion`.
///
/// Primitives yield a single leaf row. Objects and arrays yield one row per
/// entry, each followed by its own flattened children when its path is
/// expanded.
///
/// ```
/// use netmodal::tree::{flatten, ExpansionMap};
/// use serde_json::json;
///
/// let value = json!({"data": {"users": [{"name": "ada"}]}});
/// let mut expansion = ExpansionMap::new();
/// let paths: Vec<String> = flatten(&value, &expansion).map(|n| n.path).collect();
/// assert_eq!(paths, ["data", "data.users", "data.users[0]", "data.users[0].name"]);
///
/// expansion.toggle("data.users");
/// let paths: Vec<String> = flatten(&value, &expansion).map(|n| n.path).collect();
/// assert_eq!(paths, ["data", "data.users"]);
/// ```
#[must_use]
pub fn flatten<'a>(value: &'a Value, expansion: &'a ExpansionMap) -> Flatten<'a> {
    Flatten {
        root: Some(value),
        stack: Vec::new(),
        expansion,
    }
}

impl<'a> Flatten<'a> {
    fn push_children(&mut self, value: &'a Value, path: String, pointer: String, depth: usize) {
        let entries = match value {
            Value::Object(map) => Entries::Object(map.iter()),
            Value::Array(items) => Entries::Array(items.iter().enumerate()),
            _ => return,
        };
        self.stack.push(Frame {
            entries,
            path,
            pointer,
            depth,
        });
    }

    fn node_for(&self, key: String, value: &Value, path: String, pointer: String, depth: usize) -> JsonNode {
        let kind = ValueKind::of(value);
        let child_count = match value {
            Value::Object(map) => map.len(),
            Value::Array(items) => items.len(),
            _ => 0,
        };
        JsonNode {
            key,
            kind,
            preview: preview(value),
            expanded: kind.is_container() && self.expansion.is_expanded(&path),
            path,
            pointer,
            depth,
            child_count,
        }
    }
}

impl Iterator for Flatten<'_> {
    type Item = JsonNode;

    fn next(&mut self) -> Option<JsonNode> {
        if let Some(root) = self.root.take() {
            if ValueKind::of(root).is_container() {
                self.push_children(root, String::new(), String::new(), 0);
            } else {
                return Some(self.node_for(String::new(), root, String::new(), String::new(), 0));
            }
        }

        loop {
            let frame = self.stack.last_mut()?;
            let depth = frame.depth;
            let next = match &mut frame.entries {
                Entries::Object(iter) => iter.next().map(|(key, value)| {
                    (
                        key.clone(),
                        value,
                        child_path(&frame.path, key),
                        format!("{}/{}", frame.pointer, escape_pointer(key)),
                    )
                }),
                Entries::Array(iter) => iter.next().map(|(index, value)| {
                    (
                        index.to_string(),
                        value,
                        format!("{}[{index}]", frame.path),
                        format!("{}/{index}", frame.pointer),
                    )
                }),
            };

            let Some((key, value, path, pointer)) = next else {
                self.stack.pop();
                continue;
            };

            let node = self.node_for(key, value, path.clone(), pointer.clone(), depth);
            if node.expanded {
                self.push_children(value, path, pointer, depth + 1);
            }
            return Some(node);
        }
    }
}

/// Joins an object key onto a parent path.
#[must_use]
pub fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Returns the structural parent of `path`, or `None` at the top level.
///
/// A trailing bracket index is stripped first; otherwise the final dot
/// segment.
///
/// ```
/// use netmodal::tree::parent_path;
///
/// assert_eq!(parent_path("data.users[0].name").as_deref(), Some("data.users[0]"));
/// assert_eq!(parent_path("data.users[0]").as_deref(), Some("data.users"));
/// assert_eq!(parent_path("data"), None);
/// ```
#[must_use]
pub fn parent_path(path: &str) -> Option<String> {
    let parent = if path.ends_with(']') {
        path.rfind('[').map(|idx| &path[..idx])
    } else {
        path.rfind('.').map(|idx| &path[..idx])
    }?;

    if parent.is_empty() {
        None
    } else {
        Some(parent.to_string())
    }
}

fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

fn preview(value: &Value) -> String {
    match value {
        Value::Object(map) => format!("{{{}}}", map.len()),
        Value::Array(items) => format!("[{}]", items.len()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(value: &Value, expansion: &ExpansionMap) -> Vec<String> {
        flatten(value, expansion).map(|n| n.path).collect()
    }

    #[test]
    fn primitive_root_yields_single_leaf() {
        let value = json!(42);
        let nodes: Vec<JsonNode> = flatten(&value, &ExpansionMap::new()).collect();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind, ValueKind::Number);
        assert_eq!(nodes[0].preview, "42");
        assert!(nodes[0].path.is_empty());
    }

    #[test]
    fn root_array_uses_bracket_paths() {
        let value = json!([1, [2, 3]]);
        assert_eq!(paths(&value, &ExpansionMap::new()), ["[0]", "[1]", "[1][0]", "[1][1]"]);
    }

    #[test]
    fn collapsed_node_is_followed_by_next_sibling() {
        let value = json!({"a": {"x": 1, "y": 2}, "b": true});
        let mut expansion = ExpansionMap::new();
        expansion.set("a", false);
        let nodes: Vec<JsonNode> = flatten(&value, &expansion).collect();
        assert_eq!(nodes.iter().map(|n| n.path.as_str()).collect::<Vec<_>>(), ["a", "b"]);
        assert!(!nodes[0].expanded);
        assert_eq!(nodes[0].child_count, 2);
    }

    #[test]
    fn expanding_restores_children_in_structural_order() {
        let value = json!({"a": {"z": 1, "m": 2}});
        let mut expansion = ExpansionMap::new();
        let before = paths(&value, &expansion);
        expansion.toggle("a");
        expansion.toggle("a");
        assert_eq!(paths(&value, &expansion), before);
    }

    #[test]
    fn pointer_resolves_raw_value() {
        let value = json!({"a/b": [{"c~d": "x"}]});
        let nodes: Vec<JsonNode> = flatten(&value, &ExpansionMap::new()).collect();
        let leaf = nodes.last().expect("leaf");
        assert_eq!(leaf.value(&value), Some(&json!("x")));
        assert_eq!(leaf.depth, 2);
    }

    #[test]
    fn flatten_is_lazy_and_restartable() {
        let value = json!({"a": [1, 2, 3], "b": 2});
        let expansion = ExpansionMap::new();
        let first_two: Vec<String> = flatten(&value, &expansion).take(2).map(|n| n.path).collect();
        assert_eq!(first_two, ["a", "a[0]"]);
        assert_eq!(paths(&value, &expansion).len(), 5);
    }

    #[test]
    fn parent_of_nested_index() {
        assert_eq!(parent_path("a[0][1]").as_deref(), Some("a[0]"));
        assert_eq!(parent_path("[3]"), None);
    }

    #[test]
    fn string_preview_is_quoted() {
        let value = json!({"s": "hi"});
        let node = flatten(&value, &ExpansionMap::new()).next().expect("node");
        assert_eq!(node.preview, "\"hi\"");
    }
}
