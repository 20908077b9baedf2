//! Input module for global keyboard event listening
//!
//! Uses Linux evdev to read system-wide key press/release events and
//! translates raw scan codes into logical keys.

mod keys;
mod listener;

pub use keys::{Keymap, LogicalKey};
#[cfg(test)]
pub use keys::codes;
pub use listener::{KeyTransition, KeyboardListener, RawKeyEvent};
