//! Event pipeline: translate, gate on focus, run the engine, inject
//!
//! The dispatcher owns the latch engine and processes raw key events one
//! at a time; each event is fully handled before the next is received.

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::focus::{FocusGate, FocusQuery};
use crate::inject::{InputCommand, Injector};
use crate::input::RawKeyEvent;

use super::machine::LatchEngine;

pub struct Dispatcher<F, I> {
    engine: LatchEngine,
    focus: FocusGate<F>,
    injector: I,
}

impl<F: FocusQuery, I: Injector> Dispatcher<F, I> {
    pub fn new(engine: LatchEngine, focus: FocusGate<F>, injector: I) -> Self {
        Self {
            engine,
            focus,
            injector,
        }
    }

    #[cfg(test)]
    pub fn engine(&self) -> &LatchEngine {
        &self.engine
    }

    /// Process raw key events until the channel closes
    pub async fn run(&mut self, mut event_rx: mpsc::Receiver<RawKeyEvent>) {
        info!(target_window = self.focus.target(), "dispatcher started");

        while let Some(event) = event_rx.recv().await {
            self.process(event).await;
        }

        info!("dispatcher stopped - event source closed");
    }

    /// Handle a single raw key event
    pub async fn process(&mut self, event: RawKeyEvent) {
        let Some(key) = self.engine.keymap().translate(event.code) else {
            trace!(code = event.code, "unmapped scan code");
            return;
        };

        let focused = self.focus.is_target_focused().await;
        let commands = self.engine.handle(key, event.transition, focused);
        debug!(
            %key,
            transition = ?event.transition,
            focused,
            sticky = self.engine.sticky_enabled(),
            commands = commands.len(),
            "key event"
        );

        self.send_all(commands).await;
    }

    /// Release every latched key, for use on shutdown
    pub async fn release_all(&mut self) {
        let latched: Vec<_> = self.engine.latched_keys().collect();
        if !latched.is_empty() {
            info!(keys = ?latched, "releasing latched keys");
        }

        let commands = self.engine.release_all();
        self.send_all(commands).await;
    }

    /// Send commands in order; a failed command is retried once, then dropped
    ///
    /// Latch bookkeeping is not rolled back on failure.
    async fn send_all(&self, commands: Vec<InputCommand>) {
        for command in commands {
            let Err(first) = self.injector.send(command).await else {
                continue;
            };
            debug!(error = %first, "injection failed, retrying once");

            if let Err(e) = self.injector.send(command).await {
                warn!(%command, error = %e, source = %e.source, "injection failed");
            }
        }
    }
}
