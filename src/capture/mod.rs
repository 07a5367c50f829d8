//! Capture source boundary and request reconciliation.
//!
//! - [`CaptureSource`]: what the core needs from whatever produces network
//!   events (attach, fetch a body, drain events)
//! - [`Reconciler`]: turns events into request records in the store
//! - [`ProcessBridge`]: a source backed by a child process speaking JSON lines

mod bridge;
mod error;
mod events;
mod reconciler;
mod retry;
mod source;

pub use bridge::ProcessBridge;
pub use error::{CaptureError, ErrorCode, WireError};
pub use events::{BridgeCommand, CaptureEvent};
pub use reconciler::{BodyDelivery, BodyFetch, Reconciler, REATTACH_DELAY_MS};
pub use retry::RetryPolicy;
pub use source::{CaptureSource, NullSource};
