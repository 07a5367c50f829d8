//! Multi-key sequence recognition.
//!
//! # State Machine
//!
//! ```text
//!            prefix key                   completing key
//!   Idle -----------------> Pending ---------------------> Idle (Complete)
//!    ^                       |   |
//!    |     timeout           |   | any other key
//!    +-----------------------+   +---------> Idle, key handled afresh
//! ```
//!
//! Deadlines are scheduler timers tagged with a generation number, so a timer
//! left over from an earlier prefix can never expire a newer one.

use super::keys::Key;
use super::scheduler::{Millis, Scheduler, Timer};

/// Quiet period after `g` or `d` before the prefix is dropped.
pub const PREFIX_TIMEOUT_MS: Millis = 1_000;

/// Quiet period after `y` before it commits as a single-key yank.
pub const YANK_TIMEOUT_MS: Millis = 300;

/// A recognized two-key command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sequence {
    /// `gg`
    First,
    /// `dd`
    DeleteSelected,
    /// `dr`
    ClearAll,
    /// `yy`
    YankValue,
    /// `yp`
    YankPath,
}

impl Sequence {
    #[must_use]
    pub const fn keys(self) -> (char, char) {
        match self {
            Self::First => ('g', 'g'),
            Self::DeleteSelected => ('d', 'd'),
            Self::ClearAll => ('d', 'r'),
            Self::YankValue => ('y', 'y'),
            Self::YankPath => ('y', 'p'),
        }
    }
}

const fn timeout_for(prefix: char) -> Millis {
    if prefix == 'y' {
        YANK_TIMEOUT_MS
    } else {
        PREFIX_TIMEOUT_MS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceState {
    #[default]
    Idle,
    Pending {
        prefix: char,
        deadline: Millis,
        generation: u64,
    },
}

/// Result of feeding one key to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// The key completed a sequence.
    Complete(Sequence),
    /// The key started a sequence and was consumed.
    Started,
    /// The key is not part of any sequence; handle it normally.
    Passthrough(Key),
}

#[derive(Debug, Default)]
pub struct SequenceBuffer {
    state: SequenceState,
    generation: u64,
}

impl SequenceBuffer {
    #[must_use]
    pub const fn state(&self) -> SequenceState {
        self.state
    }

    /// Pending prefix, shown in the footer while waiting.
    #[must_use]
    pub const fn prefix(&self) -> Option<char> {
        match self.state {
            SequenceState::Pending { prefix, .. } => Some(prefix),
            SequenceState::Idle => None,
        }
    }

    pub fn clear(&mut self) {
        self.state = SequenceState::Idle;
    }

    /// Feeds `key`, considering only the sequences in `allowed`.
    ///
    /// A pending prefix whose deadline already passed is treated as expired
    /// even if its timer has not been dispatched yet.
    pub fn feed(&mut self, key: Key, allowed: &[Sequence], scheduler: &mut Scheduler) -> Feed {
        if let SequenceState::Pending { prefix, deadline, .. } = self.state {
            self.state = SequenceState::Idle;
            if scheduler.now() < deadline {
                if let Some(c) = key.printable() {
                    if let Some(seq) = allowed.iter().copied().find(|s| s.keys() == (prefix, c)) {
                        tracing::trace!(?seq, "sequence complete");
                        return Feed::Complete(seq);
                    }
                }
                tracing::trace!(prefix = %prefix, ?key, "sequence broken");
            }
        }

        let Some(c) = key.printable() else {
            return Feed::Passthrough(key);
        };
        if !allowed.iter().any(|s| s.keys().0 == c) {
            return Feed::Passthrough(key);
        }

        self.generation = self.generation.wrapping_add(1);
        let deadline = scheduler.schedule(
            timeout_for(c),
            Timer::SequenceTimeout {
                generation: self.generation,
            },
        );
        self.state = SequenceState::Pending {
            prefix: c,
            deadline,
            generation: self.generation,
        };
        Feed::Started
    }

    /// Expires the pending prefix if `generation` is still current.
    ///
    /// Returns the expired prefix so the caller can commit single-key
    /// fallbacks (a lone `y`).
    pub fn expire(&mut self, generation: u64) -> Option<char> {
        match self.state {
            SequenceState::Pending {
                prefix,
                generation: current,
                ..
            } if current == generation => {
                self.state = SequenceState::Idle;
                tracing::trace!(prefix = %prefix, "sequence expired");
                Some(prefix)
            }
            _ => None,
        }
    }
}
