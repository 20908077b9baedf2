//! Bounded invocation of the `xdotool` helper
//!
//! Both the focus query and the key injector shell out to `xdotool`.
//! Every call is bounded by a timeout; a timed-out child is killed.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tracing::trace;

/// Errors from running an external command
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Run `program` with `args` and return its trimmed stdout
pub async fn run(program: &str, args: &[&str], timeout: Duration) -> Result<String, CommandError> {
    trace!(program, ?args, "running command");

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(CommandError::Spawn {
                program: program.to_string(),
                source,
            })
        }
        Err(_) => {
            return Err(CommandError::Timeout {
                program: program.to_string(),
                timeout,
            })
        }
    };

    if !output.status.success() {
        return Err(CommandError::Failed {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_stdout_is_trimmed() {
        let out = tokio_test::block_on(run("echo", &["  DayZ  "], TIMEOUT)).unwrap();
        assert_eq!(out, "DayZ");
    }

    #[test]
    fn test_non_zero_exit_is_failure() {
        let err = tokio_test::block_on(run("false", &[], TIMEOUT)).unwrap_err();
        assert!(matches!(err, CommandError::Failed { .. }));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = tokio_test::block_on(run("latchkeyd-no-such-program", &[], TIMEOUT)).unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[test]
    fn test_slow_command_times_out() {
        let err = tokio_test::block_on(run("sleep", &["5"], Duration::from_millis(50))).unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
    }
}
