//! latchkeyd: Background daemon that latches keys down for a target window
//!
//! This daemon reads system-wide keyboard events and provides:
//! - Scan-code translation for a fixed set of keys
//! - A sticky mode, toggled with Q, in which W and Shift stay held down
//! - Immediate release of every latched key when the target window loses focus
//!
//! Keyboard events come from evdev; focus queries and key injection go
//! through `xdotool`.

mod config;
mod focus;
mod inject;
mod input;
mod lifecycle;
mod state;
mod xdotool;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::focus::{FocusGate, XdotoolFocus};
use crate::inject::XdotoolInjector;
use crate::input::KeyboardListener;
use crate::lifecycle::ShutdownSignal;
use crate::state::{Dispatcher, LatchEngine};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "latchkeyd starting"
    );

    let config = Config::load().context("invalid configuration")?;
    info!(
        target_window = %config.target_window,
        timeout_ms = config.command_timeout.as_millis() as u64,
        "configuration loaded"
    );

    let mut shutdown = ShutdownSignal::register()
        .context("failed to install signal handlers")?;

    // Keyboard listener threads -> dispatcher
    let (key_tx, key_rx) = mpsc::channel(64);

    let focus = FocusGate::new(
        XdotoolFocus::new(config.xdotool.clone(), config.command_timeout),
        config.target_window.clone(),
    );
    let injector = XdotoolInjector::new(config.xdotool.clone(), config.command_timeout);
    let mut dispatcher = Dispatcher::new(LatchEngine::new(config.keymap.clone()), focus, injector);

    // Without an event source there is nothing to do
    let mut listener = KeyboardListener::new(key_tx);
    listener
        .start()
        .context("failed to start keyboard listener")?;
    info!("keyboard listener started");

    info!("daemon initialized, entering main loop");

    let source_lost = tokio::select! {
        _ = dispatcher.run(key_rx) => {
            error!("every keyboard device stopped, no event source left");
            true
        }

        _ = shutdown.wait() => {
            info!("shutdown signal received");
            false
        }
    };

    // Cleanup
    info!("shutting down...");

    listener.stop();
    // Best effort: a release cut off mid-send by the select above has
    // already been booked as Released and is not retried here.
    dispatcher.release_all().await;

    info!("latchkeyd stopped");

    if source_lost {
        bail!("keyboard event source closed");
    }

    Ok(())
}
