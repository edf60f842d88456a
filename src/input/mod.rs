//! Input subsystem for the physical button pad
//!
//! Two independent samplers feed one bounded queue, drained once per frame:
//!
//! 1. [`pin_poller`] - Level-change polling of the navigation buttons
//! 2. [`power_button`] - Edge-triggered, debounced power button
//! 3. [`merger`] - Per-frame drain, merged ahead of the window's own key events
//! 4. [`input_handle`] - Lifecycle of both samplers
//!
//! # Architecture
//!
//! ```text
//! GPIO pins ──► PinPoller ─────┐
//!                              ├──► mpsc queue ──► EventMerger ──► frame events
//! Power pin ──► PowerButton ───┘                       ▲
//!                                       window keys ───┘
//! ```
//!
//! Without GPIO hardware both samplers idle and only window input remains.

pub mod debounce;
pub mod input_handle;
pub mod merger;
pub mod pin_poller;
pub mod power_button;

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use tracing::warn;

pub use debounce::Debouncer;
pub use input_handle::{InputHandle, InputSettings};
pub use merger::EventMerger;

/// Logical keys understood by the launcher, independent of their source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalKey {
    Up,
    Down,
    Left,
    Right,
    Confirm,
    Cancel,
}

impl LogicalKey {
    /// Maps a window key onto the launcher's key set
    pub fn from_egui(key: egui::Key) -> Option<Self> {
        match key {
            egui::Key::ArrowUp => Some(Self::Up),
            egui::Key::ArrowDown => Some(Self::Down),
            egui::Key::ArrowLeft => Some(Self::Left),
            egui::Key::ArrowRight => Some(Self::Right),
            egui::Key::Enter | egui::Key::Space => Some(Self::Confirm),
            egui::Key::Escape => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// Normalized input event, consumed exactly once by the frame that reads it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(LogicalKey),
    KeyUp(LogicalKey),
    Quit,
}

impl InputEvent {
    /// Translates a raw window event, ignoring everything that is not a key
    /// of interest. Auto-repeat is dropped so a held key moves the wheel once.
    pub fn from_egui(event: &egui::Event) -> Option<Self> {
        match event {
            egui::Event::Key {
                key,
                pressed,
                repeat: false,
                ..
            } => LogicalKey::from_egui(*key).map(|key| {
                if *pressed {
                    Self::KeyDown(key)
                } else {
                    Self::KeyUp(key)
                }
            }),
            _ => None,
        }
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::KeyDown(key) => write!(f, "{:?} down", key),
            Self::KeyUp(key) => write!(f, "{:?} up", key),
            Self::Quit => write!(f, "quit"),
        }
    }
}

/// Errors raised by the input samplers
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// No usable GPIO peripheral; callers degrade to idle
    #[error("GPIO unavailable: {0}")]
    HardwareUnavailable(String),

    /// A configured pin could not be claimed or configured
    #[error("Failed to claim pin {pin}: {reason}")]
    PinClaim { pin: u8, reason: String },

    /// Reading or waiting on a claimed pin failed
    #[error("Failed to read pin {pin}: {reason}")]
    PinRead { pin: u8, reason: String },

    /// The consuming side of the queue is gone
    #[error("Event queue closed")]
    QueueClosed,

    /// A sampler thread could not be started
    #[error("Failed to spawn sampler thread: {0}")]
    Spawn(String),
}

/// Queues an event without blocking the sampler. A full queue drops the event,
/// a closed one is an error.
pub(crate) fn push_event(
    sender: &mpsc::Sender<InputEvent>,
    event: InputEvent,
) -> Result<(), InputError> {
    match sender.try_send(event) {
        Ok(()) => Ok(()),
        Err(mpsc::error::TrySendError::Full(event)) => {
            warn!("Event queue full, dropping {}", event);
            Ok(())
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Err(InputError::QueueClosed),
    }
}
