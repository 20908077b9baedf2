//! Synthetic key injection
//!
//! Presses and releases logical keys through `xdotool`. The engine's
//! bookkeeping never waits on the result beyond logging failures.

use std::time::Duration;

use crate::input::LogicalKey;
use crate::xdotool::{self, CommandError};

/// A synthetic key action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
}

/// One synthetic-input command emitted by the latch engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputCommand {
    pub key: LogicalKey,
    pub action: KeyAction,
}

impl InputCommand {
    pub fn press(key: LogicalKey) -> Self {
        Self {
            key,
            action: KeyAction::Press,
        }
    }

    pub fn release(key: LogicalKey) -> Self {
        Self {
            key,
            action: KeyAction::Release,
        }
    }
}

impl std::fmt::Display for InputCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.action {
            KeyAction::Press => write!(f, "press {}", self.key),
            KeyAction::Release => write!(f, "release {}", self.key),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to {command}")]
pub struct InjectError {
    pub command: InputCommand,
    #[source]
    pub source: CommandError,
}

/// Capability to synthesize key presses and releases
pub trait Injector {
    async fn send(&self, command: InputCommand) -> Result<(), InjectError>;
}

impl<T: Injector + ?Sized> Injector for &T {
    async fn send(&self, command: InputCommand) -> Result<(), InjectError> {
        (**self).send(command).await
    }
}

/// Injects keys with `xdotool keydown` / `xdotool keyup`
#[derive(Debug, Clone)]
pub struct XdotoolInjector {
    program: String,
    timeout: Duration,
}

impl XdotoolInjector {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl Injector for XdotoolInjector {
    async fn send(&self, command: InputCommand) -> Result<(), InjectError> {
        let verb = match command.action {
            KeyAction::Press => "keydown",
            KeyAction::Release => "keyup",
        };

        xdotool::run(&self.program, &[verb, command.key.keysym()], self.timeout)
            .await
            .map(|_| ())
            .map_err(|source| InjectError { command, source })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    /// Injector that records every command and can fail on demand
    #[derive(Default)]
    pub(crate) struct RecordingInjector {
        pub(crate) sent: RefCell<Vec<InputCommand>>,
        /// Number of upcoming calls that should fail
        pub(crate) failures: Cell<usize>,
    }

    impl RecordingInjector {
        pub(crate) fn take(&self) -> Vec<InputCommand> {
            std::mem::take(&mut *self.sent.borrow_mut())
        }
    }

    impl Injector for RecordingInjector {
        async fn send(&self, command: InputCommand) -> Result<(), InjectError> {
            self.sent.borrow_mut().push(command);
            let failures = self.failures.get();
            if failures > 0 {
                self.failures.set(failures - 1);
                return Err(InjectError {
                    command,
                    source: CommandError::Timeout {
                        program: "xdotool".to_string(),
                        timeout: Duration::from_millis(500),
                    },
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_command_display() {
        assert_eq!(InputCommand::press(LogicalKey::W).to_string(), "press W");
        assert_eq!(
            InputCommand::release(LogicalKey::Shift).to_string(),
            "release Shift"
        );
    }

    #[test]
    fn test_successful_injection() {
        // `true` accepts any arguments and exits 0
        let injector = XdotoolInjector::new("true", Duration::from_secs(1));
        let result = tokio_test::block_on(injector.send(InputCommand::press(LogicalKey::W)));
        assert!(result.is_ok());
    }

    #[test]
    fn test_failed_injection_names_the_command() {
        let injector = XdotoolInjector::new("false", Duration::from_secs(1));
        let err = tokio_test::block_on(injector.send(InputCommand::release(LogicalKey::Shift)))
            .unwrap_err();
        assert_eq!(err.command, InputCommand::release(LogicalKey::Shift));
        assert_eq!(err.to_string(), "failed to release Shift");
    }
}
