//! Host-independent key representation.
//!
//! The terminal host translates its native key events into [`Key`] values
//! (see `main.rs`); everything past that point matches on these.

/// A key without modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BareKey {
    Char(char),
    Enter,
    Esc,
    Tab,
    /// Shift+Tab.
    BackTab,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
}

/// A key press, with the only modifier the keymap distinguishes.
///
/// Shift is folded into the character (`'G'`, `'H'`), so it is not tracked
/// separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub bare: BareKey,
    pub ctrl: bool,
}

impl Key {
    #[must_use]
    pub const fn new(bare: BareKey) -> Self {
        Self { bare, ctrl: false }
    }

    #[must_use]
    pub const fn char(c: char) -> Self {
        Self::new(BareKey::Char(c))
    }

    #[must_use]
    pub const fn ctrl(c: char) -> Self {
        Self {
            bare: BareKey::Char(c),
            ctrl: true,
        }
    }

    /// The printable character, if this is an unmodified character key.
    #[must_use]
    pub const fn printable(self) -> Option<char> {
        match self.bare {
            BareKey::Char(c) if !self.ctrl => Some(c),
            _ => None,
        }
    }
}

impl From<BareKey> for Key {
    fn from(bare: BareKey) -> Self {
        Self::new(bare)
    }
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        Self::char(c)
    }
}
