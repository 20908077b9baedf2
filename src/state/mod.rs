//! State machine module for key latching
//!
//! Provides the latch engine with two global states (sticky mode off/on)
//! and a per-key Released/Latched state for every latchable key, plus
//! the dispatcher that drives it from raw key events.

mod dispatch;
mod machine;

pub use dispatch::Dispatcher;
pub use machine::LatchEngine;
