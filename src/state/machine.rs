//! Core latch state machine
//!
//! Tracks the global sticky mode and, per latchable key, whether the key is
//! currently latched. Every transition returns the synthetic-input commands
//! the caller must send; the engine itself performs no I/O.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::inject::InputCommand;
use crate::input::{KeyTransition, Keymap, LogicalKey};

/// Latch state of a single latchable key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatchState {
    #[default]
    Released,
    Latched,
}

/// The state machine that decides when keys are latched and released
#[derive(Debug)]
pub struct LatchEngine {
    keymap: Keymap,
    /// Global sticky mode
    sticky: bool,
    /// One entry per latchable key, ordered for deterministic release
    latches: BTreeMap<LogicalKey, LatchState>,
}

impl LatchEngine {
    /// Create an engine with sticky mode off and every key released
    pub fn new(keymap: Keymap) -> Self {
        let latches = keymap
            .latchable()
            .iter()
            .map(|key| (*key, LatchState::Released))
            .collect();

        Self {
            keymap,
            sticky: false,
            latches,
        }
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn sticky_enabled(&self) -> bool {
        self.sticky
    }

    /// Latch state of `key`, `None` for keys that can't be latched
    #[cfg(test)]
    pub fn latch_state(&self, key: LogicalKey) -> Option<LatchState> {
        self.latches.get(&key).copied()
    }

    /// Keys that are currently latched, in release order
    pub fn latched_keys(&self) -> impl Iterator<Item = LogicalKey> + '_ {
        self.latches
            .iter()
            .filter(|(_, state)| **state == LatchState::Latched)
            .map(|(key, _)| *key)
    }

    /// Process one key event and return the commands to inject
    pub fn handle(
        &mut self,
        key: LogicalKey,
        transition: KeyTransition,
        target_focused: bool,
    ) -> Vec<InputCommand> {
        if !target_focused {
            let commands = self.release_all();
            if !commands.is_empty() {
                info!(released = commands.len(), "target lost focus, unlatching");
            }
            return commands;
        }

        if key == self.keymap.mode_toggle() && transition.is_press() {
            return self.toggle_sticky();
        }

        if !self.keymap.is_latchable(key) {
            debug!(%key, "ignoring non-latchable key");
            return Vec::new();
        }

        if self.sticky && transition.is_press() {
            return self.latch(key);
        }

        Vec::new()
    }

    /// Release every latched key, leaving sticky mode untouched
    pub fn release_all(&mut self) -> Vec<InputCommand> {
        let mut commands = Vec::new();

        for (key, state) in self.latches.iter_mut() {
            if *state == LatchState::Latched {
                info!(%key, "unlatched");
                commands.push(InputCommand::release(*key));
                *state = LatchState::Released;
            }
        }

        commands
    }

    /// Flip sticky mode and unconditionally unlatch everything
    fn toggle_sticky(&mut self) -> Vec<InputCommand> {
        self.sticky = !self.sticky;
        info!(sticky = self.sticky, "sticky mode toggled");
        self.release_all()
    }

    /// Re-assert a fresh key-down edge and mark the key latched
    fn latch(&mut self, key: LogicalKey) -> Vec<InputCommand> {
        let Some(state) = self.latches.get_mut(&key) else {
            return Vec::new();
        };

        if *state == LatchState::Latched {
            debug!(%key, "re-asserting latched key");
        } else {
            info!(%key, "latched");
        }
        *state = LatchState::Latched;

        vec![InputCommand::release(key), InputCommand::press(key)]
    }
}
