//! Application layer: key interpretation, timing and the runtime that ties
//! the store, the reconciler and the UI together.
//!
//! Data flows one way:
//!
//! ```text
//! Key / CaptureEvent / Timer → App → Store (batched) → flush → render
//!                               ↓
//!                            Actions → host (quit, clipboard)
//! ```
//!
//! # Modules
//!
//! - [`actions`]: Side effects returned to the host
//! - [`copy`]: Copy target formatting
//! - [`interpreter`]: The modal command interpreter
//! - [`keys`]: Host-independent key representation
//! - [`modes`]: Modes, detail panes and copy targets
//! - [`runtime`]: The [`App`] runtime
//! - [`scheduler`]: Virtual clock and timers
//! - [`sequence`]: Multi-key sequence buffer
//!
//! # Example
//!
//! ```rust
//! use netmodal::app::{App, AppOptions, Key};
//! use netmodal::capture::NullSource;
//!
//! let mut app = App::new(Box::new(NullSource), AppOptions::default(), 0);
//! app.start();
//! let actions = app.handle_key(Key::from('q'), 10);
//! assert_eq!(actions, vec![netmodal::app::Action::Quit]);
//! ```

pub mod actions;
pub mod copy;
pub mod interpreter;
pub mod keys;
pub mod modes;
pub mod runtime;
pub mod scheduler;
pub mod sequence;

pub use actions::Action;
pub use copy::{CopyFormatter, DefaultCopyFormatter};
pub use interpreter::{BodyWaiter, Context, Interpreter};
pub use keys::{BareKey, Key};
pub use modes::{CopyTarget, Mode, Pane};
pub use runtime::{App, AppOptions};
pub use scheduler::{Millis, Scheduler, Timer};
pub use sequence::{Sequence, SequenceBuffer};
