use rppal::gpio::{Gpio, InputPin, Level};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::{push_event, InputError, InputEvent, LogicalKey};

/// Source of logical pin levels. Implemented over rppal on the device and by
/// scripted pins in tests.
pub trait PinBackend: Send + fmt::Debug {
    fn read(&mut self, pin: u8) -> Result<Level, InputError>;
}

/// Navigation buttons claimed through rppal, configured as pull-up inputs
#[derive(Debug)]
pub struct RppalPins {
    pins: HashMap<u8, InputPin>,
}

impl RppalPins {
    pub fn open(pin_numbers: impl IntoIterator<Item = u8>) -> Result<Self, InputError> {
        let gpio = Gpio::new().map_err(|e| InputError::HardwareUnavailable(e.to_string()))?;

        let mut pins = HashMap::new();
        for pin in pin_numbers {
            let input = gpio
                .get(pin)
                .map_err(|e| InputError::PinClaim {
                    pin,
                    reason: e.to_string(),
                })?
                .into_input_pullup();
            debug!("Claimed GPIO {} as pull-up input", pin);
            pins.insert(pin, input);
        }

        Ok(Self { pins })
    }
}

impl PinBackend for RppalPins {
    fn read(&mut self, pin: u8) -> Result<Level, InputError> {
        self.pins
            .get(&pin)
            .map(InputPin::read)
            .ok_or_else(|| InputError::PinRead {
                pin,
                reason: "pin was not claimed".to_string(),
            })
    }
}

// Poller settings
#[derive(Clone, Debug)]
pub struct PollerSettings {
    pub pin_map: Vec<(u8, LogicalKey)>,
    pub poll_interval: Duration,
    pub idle_interval: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            pin_map: vec![
                (17, LogicalKey::Up),
                (18, LogicalKey::Down),
                (27, LogicalKey::Left),
                (22, LogicalKey::Right),
                (23, LogicalKey::Confirm),
                (24, LogicalKey::Cancel),
            ],
            poll_interval: Duration::from_millis(10),
            idle_interval: Duration::from_millis(250),
        }
    }
}

pub trait PollerState: fmt::Debug {}

#[derive(Debug, Clone)]
pub struct Initializing;

#[derive(Debug, Clone)]
pub struct Polling;

impl PollerState for Initializing {}
impl PollerState for Polling {}

#[derive(Debug)]
pub struct PinPoller<S: PollerState> {
    settings: PollerSettings,

    // None when no GPIO hardware is present
    backend: Option<Box<dyn PinBackend>>,

    // Last seen level per pin; buttons idle high
    last_levels: HashMap<u8, Level>,

    // Pins whose last read failed, so each failure is logged once
    failing_pins: HashSet<u8>,

    event_sender: mpsc::Sender<InputEvent>,

    running: Arc<AtomicBool>,

    state: PhantomData<S>,
}

impl<S: PollerState> PinPoller<S> {
    pub fn settings(&self) -> &PollerSettings {
        &self.settings
    }

    pub fn has_hardware(&self) -> bool {
        self.backend.is_some()
    }

    fn transition<N: PollerState>(self) -> PinPoller<N> {
        PinPoller {
            settings: self.settings,
            backend: self.backend,
            last_levels: self.last_levels,
            failing_pins: self.failing_pins,
            event_sender: self.event_sender,
            running: self.running,
            state: PhantomData,
        }
    }
}

impl PinPoller<Initializing> {
    pub fn create(
        settings: PollerSettings,
        backend: Option<Box<dyn PinBackend>>,
        event_sender: mpsc::Sender<InputEvent>,
        running: Arc<AtomicBool>,
    ) -> Self {
        debug!("Creating pin poller with settings: {:?}", settings);
        let last_levels = settings
            .pin_map
            .iter()
            .map(|(pin, _)| (*pin, Level::High))
            .collect();

        Self {
            settings,
            backend,
            last_levels,
            failing_pins: HashSet::new(),
            event_sender,
            running,
            state: PhantomData,
        }
    }

    pub fn initialize(self) -> PinPoller<Polling> {
        if self.backend.is_some() {
            info!(
                "Pin poller watching {} pins every {:?}",
                self.settings.pin_map.len(),
                self.settings.poll_interval
            );
        } else {
            warn!("No GPIO hardware, pin poller continuing in idle mode");
        }
        self.transition()
    }
}

impl PinPoller<Polling> {
    /// Compares every watched pin against its last level and queues one event
    /// per change. Returns the number of events queued.
    ///
    /// A pin that fails to read is skipped for this pass; the others are
    /// still polled. Only a closed queue is returned as an error.
    pub fn poll_once(&mut self) -> Result<usize, InputError> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(0);
        };

        let mut emitted = 0;
        for &(pin, key) in &self.settings.pin_map {
            let level = match backend.read(pin) {
                Ok(level) => {
                    if self.failing_pins.remove(&pin) {
                        info!("GPIO {} readable again", pin);
                    }
                    level
                }
                Err(e) => {
                    if self.failing_pins.insert(pin) {
                        error!("Error reading GPIO {}: {}", pin, e);
                    }
                    continue;
                }
            };
            let last = self.last_levels.entry(pin).or_insert(Level::High);
            if level == *last {
                continue;
            }
            *last = level;

            // Active low
            let event = match level {
                Level::Low => InputEvent::KeyDown(key),
                Level::High => InputEvent::KeyUp(key),
            };
            debug!("GPIO {} changed to {:?}: {}", pin, level, event);
            push_event(&self.event_sender, event)?;
            emitted += 1;
        }

        Ok(emitted)
    }

    pub fn failing_pins(&self) -> &HashSet<u8> {
        &self.failing_pins
    }

    pub fn run_polling_loop(&mut self) {
        info!("Starting pin poller loop");

        while self.running.load(Ordering::Acquire) {
            if self.backend.is_none() {
                std::thread::sleep(self.settings.idle_interval);
                continue;
            }

            if let Err(e) = self.poll_once() {
                warn!("Stopping pin poller: {}", e);
                break;
            }

            std::thread::sleep(self.settings.poll_interval);
        }

        info!("Pin poller loop finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    // Replays a fixed sequence of levels per pin, then holds the last one
    #[derive(Debug, Default)]
    struct ScriptedPins {
        script: HashMap<u8, VecDeque<Level>>,
        held: HashMap<u8, Level>,
        // Remaining failed reads per pin
        failures: HashMap<u8, usize>,
    }

    impl ScriptedPins {
        fn with(mut self, pin: u8, levels: &[Level]) -> Self {
            self.script.insert(pin, levels.iter().copied().collect());
            self
        }

        fn failing(mut self, pin: u8, reads: usize) -> Self {
            self.failures.insert(pin, reads);
            self
        }
    }

    impl PinBackend for ScriptedPins {
        fn read(&mut self, pin: u8) -> Result<Level, InputError> {
            if let Some(remaining) = self.failures.get_mut(&pin).filter(|n| **n > 0) {
                *remaining -= 1;
                return Err(InputError::PinRead {
                    pin,
                    reason: "line busy".to_string(),
                });
            }
            let held = self.held.entry(pin).or_insert(Level::High);
            if let Some(next) = self.script.get_mut(&pin).and_then(VecDeque::pop_front) {
                *held = next;
            }
            Ok(*held)
        }
    }

    fn poller(
        backend: Option<Box<dyn PinBackend>>,
    ) -> (PinPoller<Polling>, mpsc::Receiver<InputEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let settings = PollerSettings {
            pin_map: vec![(27, LogicalKey::Left), (22, LogicalKey::Right)],
            ..PollerSettings::default()
        };
        let poller =
            PinPoller::create(settings, backend, tx, Arc::new(AtomicBool::new(true))).initialize();
        (poller, rx)
    }

    #[test]
    fn level_changes_become_key_events() {
        let pins = ScriptedPins::default().with(22, &[Level::Low, Level::Low, Level::High]);
        let (mut poller, mut rx) = poller(Some(Box::new(pins)));

        assert_eq!(poller.poll_once().unwrap(), 1);
        assert_eq!(poller.poll_once().unwrap(), 0);
        assert_eq!(poller.poll_once().unwrap(), 1);

        assert_eq!(rx.try_recv().unwrap(), InputEvent::KeyDown(LogicalKey::Right));
        assert_eq!(rx.try_recv().unwrap(), InputEvent::KeyUp(LogicalKey::Right));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn idle_pins_emit_nothing() {
        let (mut poller, mut rx) = poller(Some(Box::new(ScriptedPins::default())));
        for _ in 0..5 {
            assert_eq!(poller.poll_once().unwrap(), 0);
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn missing_hardware_degrades_to_idle() {
        let (mut poller, mut rx) = poller(None);
        assert!(!poller.has_hardware());
        assert_eq!(poller.poll_once().unwrap(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_queue_is_reported() {
        let pins = ScriptedPins::default().with(27, &[Level::Low]);
        let (mut poller, rx) = poller(Some(Box::new(pins)));
        drop(rx);
        assert!(matches!(poller.poll_once(), Err(InputError::QueueClosed)));
    }

    #[test]
    fn failing_pin_does_not_block_the_others() {
        // GPIO 27 is polled first and fails for three passes
        let pins = ScriptedPins::default()
            .failing(27, 3)
            .with(22, &[Level::Low, Level::High]);
        let (mut poller, mut rx) = poller(Some(Box::new(pins)));

        assert_eq!(poller.poll_once().unwrap(), 1);
        assert!(poller.failing_pins().contains(&27));
        assert_eq!(poller.poll_once().unwrap(), 1);
        assert_eq!(poller.poll_once().unwrap(), 0);
        assert!(poller.failing_pins().contains(&27));

        assert_eq!(rx.try_recv().unwrap(), InputEvent::KeyDown(LogicalKey::Right));
        assert_eq!(rx.try_recv().unwrap(), InputEvent::KeyUp(LogicalKey::Right));

        // Recovered pin drops out of the failing set
        assert_eq!(poller.poll_once().unwrap(), 0);
        assert!(poller.failing_pins().is_empty());
        assert!(rx.try_recv().is_err());
    }
}
