use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::InputEvent;

/// Per-frame merge of the hardware queue into the window's event stream.
///
/// Hardware events are drained without blocking and placed ahead of the
/// window's own events for the same frame.
#[derive(Debug)]
pub struct EventMerger {
    receiver: mpsc::Receiver<InputEvent>,
    disconnected: bool,
}

impl EventMerger {
    pub fn new(receiver: mpsc::Receiver<InputEvent>) -> Self {
        Self {
            receiver,
            disconnected: false,
        }
    }

    /// Takes everything currently queued by the samplers
    pub fn drain(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        warn!("Hardware event queue disconnected, window input only");
                        self.disconnected = true;
                    }
                    break;
                }
            }
        }

        if !events.is_empty() {
            debug!("Drained {} hardware events", events.len());
        }
        events
    }

    /// Builds the ordered event list for one frame: queued hardware events
    /// first, then the window's native events in their original order.
    pub fn merge_frame<I>(&mut self, native: I) -> Vec<InputEvent>
    where
        I: IntoIterator<Item = InputEvent>,
    {
        let mut events = self.drain();
        events.extend(native);
        events
    }
}
