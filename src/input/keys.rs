//! Logical key definitions and scan-code translation
//!
//! Provides the fixed set of logical keys the daemon knows about and the
//! two static tables that drive it: the broad scan-code table and the
//! narrow latchable subset.

use std::fmt;

/// Linux evdev key codes for the keys we translate
///
/// The X11 keycode of each key is the evdev code + 8.
pub mod codes {
    /// `KEY_Q`
    pub const Q: u16 = 16;
    /// `KEY_W`
    pub const W: u16 = 17;
    /// `KEY_T`
    pub const T: u16 = 20;
    /// `KEY_A`
    pub const A: u16 = 30;
    /// `KEY_S`
    pub const S: u16 = 31;
    /// `KEY_D`
    pub const D: u16 = 32;
    /// `KEY_LEFTSHIFT`
    pub const LEFT_SHIFT: u16 = 42;
}

/// A key the daemon can reason about
///
/// Declaration order is the order in which latched keys are released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogicalKey {
    /// Move forward
    W,
    A,
    S,
    D,
    /// Left shift (sprint)
    Shift,
    T,
    /// Sticky mode toggle
    Q,
}

impl LogicalKey {
    /// Display name used in logs
    pub fn name(self) -> &'static str {
        match self {
            LogicalKey::W => "W",
            LogicalKey::A => "A",
            LogicalKey::S => "S",
            LogicalKey::D => "D",
            LogicalKey::Shift => "Shift",
            LogicalKey::T => "T",
            LogicalKey::Q => "Q",
        }
    }

    /// X11 keysym handed to the injector
    ///
    /// Letters are lowercase so the injector does not add an implicit Shift.
    pub fn keysym(self) -> &'static str {
        match self {
            LogicalKey::W => "w",
            LogicalKey::A => "a",
            LogicalKey::S => "s",
            LogicalKey::D => "d",
            LogicalKey::Shift => "Shift_L",
            LogicalKey::T => "t",
            LogicalKey::Q => "q",
        }
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scan code to logical key table
const SCAN_CODES: &[(u16, LogicalKey)] = &[
    (codes::W, LogicalKey::W),
    (codes::A, LogicalKey::A),
    (codes::S, LogicalKey::S),
    (codes::D, LogicalKey::D),
    (codes::LEFT_SHIFT, LogicalKey::Shift),
    (codes::T, LogicalKey::T),
    (codes::Q, LogicalKey::Q),
];

/// Keys that may be latched
const LATCHABLE: &[LogicalKey] = &[LogicalKey::W, LogicalKey::Shift];

/// Static key configuration: translation table, latchable set and mode toggle
#[derive(Debug, Clone)]
pub struct Keymap {
    scan_codes: &'static [(u16, LogicalKey)],
    latchable: &'static [LogicalKey],
    mode_toggle: LogicalKey,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            scan_codes: SCAN_CODES,
            latchable: LATCHABLE,
            mode_toggle: LogicalKey::Q,
        }
    }
}

impl Keymap {
    /// Translate a raw scan code, `None` for codes we don't track
    pub fn translate(&self, code: u16) -> Option<LogicalKey> {
        self.scan_codes
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, key)| *key)
    }

    /// Scan code bound to a logical key, if any
    pub fn scan_code(&self, key: LogicalKey) -> Option<u16> {
        self.scan_codes
            .iter()
            .find(|(_, k)| *k == key)
            .map(|(code, _)| *code)
    }

    pub fn is_latchable(&self, key: LogicalKey) -> bool {
        self.latchable.contains(&key)
    }

    pub fn latchable(&self) -> &[LogicalKey] {
        self.latchable
    }

    pub fn mode_toggle(&self) -> LogicalKey {
        self.mode_toggle
    }
}
