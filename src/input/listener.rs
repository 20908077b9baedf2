//! System-wide keyboard listener using Linux evdev
//!
//! Reads key events from every keyboard under `/dev/input`. Devices are
//! never grabbed, so the physical events still reach every client.
//! Each device is read on a dedicated thread.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use evdev::{Device, EventType, InputEvent, InputEventKind};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const INPUT_DIR: &str = "/dev/input";

/// evdev `EV_KEY` values
const KEY_RELEASE: i32 = 0;
const KEY_PRESS: i32 = 1;

/// Kind of a raw key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransition {
    Press,
    Release,
}

impl KeyTransition {
    pub fn is_press(self) -> bool {
        matches!(self, KeyTransition::Press)
    }
}

/// A key event as delivered by the hardware, before translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    /// evdev key code
    pub code: u16,
    pub transition: KeyTransition,
}

impl RawKeyEvent {
    /// Classify an evdev record, skipping anything that isn't a press or release
    ///
    /// Auto-repeat (value 2) is skipped: the physical key is already down.
    pub fn from_input_event(event: &InputEvent) -> Option<Self> {
        let InputEventKind::Key(key) = event.kind() else {
            return None;
        };

        let transition = match event.value() {
            KEY_PRESS => KeyTransition::Press,
            KEY_RELEASE => KeyTransition::Release,
            _ => return None,
        };

        Some(Self {
            code: key.code(),
            transition,
        })
    }
}

/// Errors that can occur while setting up the keyboard listener
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("keyboard listener is already running")]
    AlreadyRunning,

    #[error("cannot read /dev/input - is the user in the 'input' group?")]
    InputDir(#[source] std::io::Error),

    #[error("no readable keyboard device found under /dev/input")]
    NoKeyboards,

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),
}

/// Listener that forwards raw key events from all keyboards into a channel
pub struct KeyboardListener {
    /// Handed out to the reader threads by `start()`
    event_tx: Option<mpsc::Sender<RawKeyEvent>>,
    running: Arc<AtomicBool>,
}

impl KeyboardListener {
    pub fn new(event_tx: mpsc::Sender<RawKeyEvent>) -> Self {
        Self {
            event_tx: Some(event_tx),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the listener
    ///
    /// Opens every keyboard device and spawns one reader thread per device.
    /// Fails if no keyboard could be opened.
    ///
    /// Only the reader threads keep a sender, so the channel closes once
    /// the last device stops.
    pub fn start(&mut self) -> Result<(), ListenerError> {
        let event_tx = self.event_tx.take().ok_or(ListenerError::AlreadyRunning)?;
        self.running.store(true, Ordering::SeqCst);

        let devices = match find_keyboards() {
            Ok(devices) if !devices.is_empty() => devices,
            Ok(_) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(ListenerError::NoKeyboards);
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        for (index, (path, device)) in devices.into_iter().enumerate() {
            let event_tx = event_tx.clone();
            let running = Arc::clone(&self.running);

            thread::Builder::new()
                .name(format!("keyboard-listener:{index}"))
                .spawn(move || {
                    info!(?path, "keyboard listener thread started");

                    if let Err(e) = read_device(device, event_tx, running) {
                        warn!(?path, error = %e, "keyboard device read failed");
                    }

                    info!(?path, "keyboard listener thread stopped");
                })
                .map_err(|e| {
                    self.running.store(false, Ordering::SeqCst);
                    ListenerError::ThreadSpawn(e.to_string())
                })?;
        }

        Ok(())
    }

    /// Stop the listener
    ///
    /// Reader threads exit on their next event, or with the process.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

}

/// Find and open every device that looks like a real keyboard
fn find_keyboards() -> Result<Vec<(PathBuf, Device)>, ListenerError> {
    let entries = std::fs::read_dir(INPUT_DIR).map_err(ListenerError::InputDir)?;
    let mut keyboards = Vec::new();

    for entry in entries.flatten() {
        let path = entry.path();
        let is_event_node = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("event"));
        if !is_event_node {
            continue;
        }

        match Device::open(&path) {
            Ok(device) => {
                if is_keyboard(&device) {
                    info!(?path, name = device.name().unwrap_or("unknown"), "found keyboard");
                    keyboards.push((path, device));
                }
            }
            Err(e) => {
                debug!(?path, error = %e, "cannot open input device");
            }
        }
    }

    Ok(keyboards)
}

fn is_keyboard(device: &Device) -> bool {
    if !device.supported_events().contains(EventType::KEY) {
        return false;
    }
    device.supported_keys().is_some_and(|keys| {
        keys.contains(evdev::Key::KEY_A)
            && keys.contains(evdev::Key::KEY_Z)
            && keys.contains(evdev::Key::KEY_SPACE)
    })
}

/// Blocking read loop for one device
fn read_device(
    mut device: Device,
    event_tx: mpsc::Sender<RawKeyEvent>,
    running: Arc<AtomicBool>,
) -> std::io::Result<()> {
    while running.load(Ordering::SeqCst) {
        for event in device.fetch_events()? {
            let Some(raw) = RawKeyEvent::from_input_event(&event) else {
                continue;
            };

            if event_tx.blocking_send(raw).is_err() {
                error!("failed to forward key event - channel closed");
                return Ok(());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_event(code: u16, value: i32) -> InputEvent {
        InputEvent::new(EventType::KEY, code, value)
    }

    #[test]
    fn test_listener_creation() {
        let (tx, _rx) = mpsc::channel(32);
        let listener = KeyboardListener::new(tx);
        assert!(listener.event_tx.is_some());
        assert!(!listener.running.load(Ordering::SeqCst));
    }

    #[test]
    fn test_start_gives_up_the_original_sender() {
        let (tx, _rx) = mpsc::channel(32);
        let mut listener = KeyboardListener::new(tx);

        // Whether or not a keyboard is available here, the listener itself
        // must no longer hold a sender afterwards
        let _ = listener.start();
        assert!(listener.event_tx.is_none());

        assert!(matches!(listener.start(), Err(ListenerError::AlreadyRunning)));
    }

    #[test]
    fn test_channel_closes_without_readers() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut listener = KeyboardListener::new(tx);
        listener.event_tx.take();

        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_classify_press_and_release() {
        let press = RawKeyEvent::from_input_event(&key_event(17, 1)).unwrap();
        assert_eq!(press.code, 17);
        assert_eq!(press.transition, KeyTransition::Press);

        let release = RawKeyEvent::from_input_event(&key_event(17, 0)).unwrap();
        assert_eq!(release.transition, KeyTransition::Release);
        assert!(!release.transition.is_press());
    }

    #[test]
    fn test_auto_repeat_is_skipped() {
        assert_eq!(RawKeyEvent::from_input_event(&key_event(17, 2)), None);
        assert_eq!(RawKeyEvent::from_input_event(&key_event(17, -1)), None);
    }

    #[test]
    fn test_non_key_events_are_skipped() {
        let sync = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);
        assert_eq!(RawKeyEvent::from_input_event(&sync), None);

        let misc = InputEvent::new(EventType::MISC, 4, 458778);
        assert_eq!(RawKeyEvent::from_input_event(&misc), None);
    }
}
