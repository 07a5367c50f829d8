//! User interface layer.
//!
//! Turns the committed state into ANSI frames. Nothing here mutates the
//! store except the panel navigation methods, which the interpreter calls.
//!
//! # Architecture
//!
//! ```text
//! AppState + RequestList slots → compute_viewmodel → UIViewModel → render → String
//! ```
//!
//! # Modules
//!
//! - [`virtual_list`]: Windowing arithmetic and slot recycling
//! - [`panels`]: Request list and detail pane navigation
//! - [`viewmodel`]: Display-ready view model types
//! - [`renderer`]: Layout and frame assembly
//! - [`components`]: Individual component renderers
//! - [`helpers`]: Shared text and escape sequence utilities
//! - [`theme`]: Color schemes

pub mod components;
pub mod helpers;
pub mod panels;
pub mod renderer;
pub mod theme;
pub mod viewmodel;
pub mod virtual_list;

pub use renderer::{render, Frame, Layout};
pub use theme::Theme;
pub use viewmodel::{compute_viewmodel, UIViewModel, ViewContext};
pub use virtual_list::{ReconcileStats, SlotPool, VirtualList};
