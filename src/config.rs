//! Compiled-in daemon configuration
//!
//! Nothing is loaded at runtime: no files, flags or environment variables.

use std::time::Duration;

use anyhow::{bail, Result};

use crate::input::Keymap;

/// Title of the window that enables latching, matched exactly
const TARGET_WINDOW_NAME: &str = "DayZ";

/// Upper bound on every focus query and injection
const COMMAND_TIMEOUT: Duration = Duration::from_millis(500);

/// Helper used for focus queries and key injection
const XDOTOOL: &str = "xdotool";

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Exact, case-sensitive title of the target window
    pub target_window: String,

    /// Timeout applied to every external command
    pub command_timeout: Duration,

    /// Program used to query focus and inject keys
    pub xdotool: String,

    /// Scan-code table, latchable keys and mode toggle
    pub keymap: Keymap,
}

impl Config {
    /// Build the compiled-in configuration and check it
    pub fn load() -> Result<Self> {
        let config = Self {
            target_window: TARGET_WINDOW_NAME.to_string(),
            command_timeout: COMMAND_TIMEOUT,
            xdotool: XDOTOOL.to_string(),
            keymap: Keymap::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_window.trim().is_empty() {
            bail!("target window name must not be empty");
        }
        if self.command_timeout.is_zero() {
            bail!("command timeout must be non-zero");
        }

        let toggle = self.keymap.mode_toggle();
        if self.keymap.is_latchable(toggle) {
            bail!("mode toggle key {toggle} must not be latchable");
        }
        if self.keymap.scan_code(toggle).is_none() {
            bail!("mode toggle key {toggle} has no scan code");
        }
        for key in self.keymap.latchable() {
            if self.keymap.scan_code(*key).is_none() {
                bail!("latchable key {key} has no scan code");
            }
        }

        Ok(())
    }
}
