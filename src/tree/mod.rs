//! Hierarchical value model for inspecting JSON bodies.
//!
//! A JSON value is flattened into an ordered sequence of navigable
//! [`JsonNode`]s. Containers contribute one node per entry; an entry's own
//! children follow it only while its path is expanded in the
//! [`ExpansionMap`]. Paths use dot/bracket syntax (`data.users[0].name`).
//!
//! Flattening is lazy: [`flatten`] returns an iterator that walks the value
//! with an explicit stack, so it can be restarted (call it again or clone it)
//! and never materializes more than the caller consumes.

mod expansion;
mod flatten;

pub use expansion::ExpansionMap;
pub use flatten::{child_path, flatten, parent_path, Flatten, JsonNode, ValueKind};
