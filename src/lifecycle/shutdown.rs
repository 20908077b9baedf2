//! Signal handling for graceful shutdown

use std::io;

use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::debug;

/// Handles shutdown signals (SIGTERM, SIGINT, SIGHUP)
///
/// Handlers are installed when the value is created, so a signal that
/// arrives before `wait()` is polled is not lost.
pub struct ShutdownSignal {
    sigterm: Signal,
    sigint: Signal,
    sighup: Signal,
}

impl ShutdownSignal {
    /// Install the signal handlers
    pub fn register() -> io::Result<Self> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate())?,
            sigint: signal(SignalKind::interrupt())?,
            sighup: signal(SignalKind::hangup())?,
        })
    }

    /// Wait for a shutdown signal
    pub async fn wait(&mut self) {
        tokio::select! {
            _ = self.sigterm.recv() => {
                debug!("received SIGTERM");
            }
            _ = self.sigint.recv() => {
                debug!("received SIGINT");
            }
            _ = self.sighup.recv() => {
                debug!("received SIGHUP");
            }
        }
    }
}

