//! Actions representing side effects to be executed by the terminal host.
//!
//! The core never touches the terminal or the clipboard itself. Key handling
//! and ticks return `Vec<Action>`; the host executes them in order.
//!
//! # Example
//!
//! ```rust
//! use netmodal::app::Action;
//!
//! let actions = vec![Action::Copy {
//!     label: "URL".into(),
//!     text: "https://example.com/".into(),
//! }];
//! assert!(!actions.contains(&Action::Quit));
//! ```

/// Commands representing side effects to be executed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Leave the application and restore the terminal.
    Quit,

    /// Put `text` on the system clipboard.
    ///
    /// `label` names what was copied, for logging.
    Copy {
        /// Human-readable name of the copied item.
        label: String,
        /// Text to place on the clipboard.
        text: String,
    },
}
