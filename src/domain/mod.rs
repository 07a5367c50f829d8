//! Domain layer for netmodal.
//!
//! Core types independent of the capture source, the terminal, or storage.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`request`]: Captured request model and display helpers

pub mod error;
pub mod request;

pub use error::{NetmodalError, Result};
pub use request::{Headers, Request, ResourceType, ResponseBody};
