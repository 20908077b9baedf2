//! Focus gate: is the target window focused right now?
//!
//! The active window title is queried fresh for every event and compared
//! exactly (case-sensitive) against the configured target name. Any failure
//! to answer counts as "not focused".

use std::time::Duration;

use tracing::debug;

use crate::xdotool::{self, CommandError};

/// Source of the active window's title
pub trait FocusQuery {
    async fn active_window_title(&self) -> Result<String, CommandError>;
}

impl<T: FocusQuery + ?Sized> FocusQuery for &T {
    async fn active_window_title(&self) -> Result<String, CommandError> {
        (**self).active_window_title().await
    }
}

/// Queries the active window through `xdotool`
#[derive(Debug, Clone)]
pub struct XdotoolFocus {
    program: String,
    timeout: Duration,
}

impl XdotoolFocus {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl FocusQuery for XdotoolFocus {
    async fn active_window_title(&self) -> Result<String, CommandError> {
        xdotool::run(
            &self.program,
            &["getactivewindow", "getwindowname"],
            self.timeout,
        )
        .await
    }
}

/// Compares the focused window against the target name
pub struct FocusGate<F> {
    query: F,
    target: String,
}

impl<F: FocusQuery> FocusGate<F> {
    pub fn new(query: F, target: impl Into<String>) -> Self {
        Self {
            query,
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// True iff the active window title exactly equals the target
    pub async fn is_target_focused(&self) -> bool {
        match self.query.active_window_title().await {
            Ok(title) => title.trim() == self.target,
            Err(e) => {
                debug!(error = %e, "focus query failed, treating as unfocused");
                false
            }
        }
    }
}
