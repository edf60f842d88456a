use rppal::gpio::{Gpio, InputPin, Trigger};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use super::{push_event, Debouncer, InputError, InputEvent};

/// Blocking wait for a falling edge on the power button line
pub trait EdgeDetector: Send + fmt::Debug {
    /// Returns Ok(true) if an edge arrived before `timeout` elapsed
    fn wait_for_falling_edge(&mut self, timeout: Duration) -> Result<bool, InputError>;
}

/// Power button on a pull-up input with a falling-edge interrupt
#[derive(Debug)]
pub struct RppalEdge {
    pin_number: u8,
    pin: InputPin,
}

impl RppalEdge {
    pub fn open(pin_number: u8) -> Result<Self, InputError> {
        let gpio = Gpio::new().map_err(|e| InputError::HardwareUnavailable(e.to_string()))?;
        let claim_error = |e: rppal::gpio::Error| InputError::PinClaim {
            pin: pin_number,
            reason: e.to_string(),
        };

        let mut pin = gpio.get(pin_number).map_err(claim_error)?.into_input_pullup();
        // Debounce is done in software so rejected presses never reach the queue
        pin.set_interrupt(Trigger::FallingEdge, None)
            .map_err(claim_error)?;
        debug!("Armed falling-edge interrupt on GPIO {}", pin_number);

        Ok(Self { pin_number, pin })
    }
}

impl EdgeDetector for RppalEdge {
    fn wait_for_falling_edge(&mut self, timeout: Duration) -> Result<bool, InputError> {
        self.pin
            .poll_interrupt(false, Some(timeout))
            .map(|event| event.is_some())
            .map_err(|e| InputError::PinRead {
                pin: self.pin_number,
                reason: e.to_string(),
            })
    }
}

impl Drop for RppalEdge {
    fn drop(&mut self) {
        if let Err(e) = self.pin.clear_interrupt() {
            warn!("Error removing interrupt on GPIO {}: {}", self.pin_number, e);
        }
    }
}

#[derive(Clone, Debug)]
pub struct PowerButtonSettings {
    pub pin: u8,
    pub debounce: Duration,

    // Upper bound on how long a stop request can go unnoticed
    pub wait_timeout: Duration,
}

impl Default for PowerButtonSettings {
    fn default() -> Self {
        Self {
            pin: 5,
            debounce: Duration::from_millis(200),
            wait_timeout: Duration::from_millis(100),
        }
    }
}

pub trait MonitorState: fmt::Debug {}

#[derive(Debug, Clone)]
pub struct Initializing;

#[derive(Debug, Clone)]
pub struct Armed;

impl MonitorState for Initializing {}
impl MonitorState for Armed {}

#[derive(Debug)]
pub struct PowerButtonMonitor<S: MonitorState> {
    settings: PowerButtonSettings,
    detector: Option<Box<dyn EdgeDetector>>,
    debouncer: Debouncer,
    event_sender: mpsc::Sender<InputEvent>,
    running: Arc<AtomicBool>,
    state: PhantomData<S>,
}

impl<S: MonitorState> PowerButtonMonitor<S> {
    fn transition<N: MonitorState>(self) -> PowerButtonMonitor<N> {
        PowerButtonMonitor {
            settings: self.settings,
            detector: self.detector,
            debouncer: self.debouncer,
            event_sender: self.event_sender,
            running: self.running,
            state: PhantomData,
        }
    }
}

impl PowerButtonMonitor<Initializing> {
    pub fn create(
        settings: PowerButtonSettings,
        detector: Option<Box<dyn EdgeDetector>>,
        event_sender: mpsc::Sender<InputEvent>,
        running: Arc<AtomicBool>,
    ) -> Self {
        debug!("Creating power button monitor with settings: {:?}", settings);
        let debouncer = Debouncer::new(settings.debounce);
        Self {
            settings,
            detector,
            debouncer,
            event_sender,
            running,
            state: PhantomData,
        }
    }

    pub fn arm(self) -> PowerButtonMonitor<Armed> {
        if self.detector.is_some() {
            info!(
                "Power button armed on GPIO {} with {:?} debounce",
                self.settings.pin, self.settings.debounce
            );
        } else {
            warn!("No GPIO hardware, power button monitor continuing in idle mode");
        }
        self.transition()
    }
}

impl PowerButtonMonitor<Armed> {
    /// Handles one falling edge observed at `now`. Returns true if it was
    /// accepted and a quit event was queued.
    pub fn handle_edge(&mut self, now: Instant) -> Result<bool, InputError> {
        if !self.debouncer.accept(now) {
            trace!("Power button edge inside debounce window, dropped");
            return Ok(false);
        }

        info!("Power button pressed, requesting shutdown");
        push_event(&self.event_sender, InputEvent::Quit)?;
        Ok(true)
    }

    pub fn run_monitor_loop(&mut self) {
        info!("Starting power button monitor loop");
        let mut failing = false;

        while self.running.load(Ordering::Acquire) {
            let Some(detector) = self.detector.as_mut() else {
                std::thread::sleep(self.settings.wait_timeout);
                continue;
            };

            let edge = match detector.wait_for_falling_edge(self.settings.wait_timeout) {
                Ok(edge) => {
                    if std::mem::take(&mut failing) {
                        info!("Power button readable again");
                    }
                    edge
                }
                Err(e) => {
                    if !failing {
                        error!("Error waiting for power button: {}", e);
                        failing = true;
                    }
                    std::thread::sleep(self.settings.wait_timeout);
                    continue;
                }
            };

            if edge {
                if let Err(e) = self.handle_edge(Instant::now()) {
                    warn!("Stopping power button monitor: {}", e);
                    break;
                }
            }
        }

        info!("Power button monitor loop finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    // Yields scripted edges, then clears the running flag
    #[derive(Debug)]
    struct ScriptedEdges {
        // Failed waits returned before the first edge
        failures: usize,
        edges: VecDeque<bool>,
        running: Arc<AtomicBool>,
    }

    impl EdgeDetector for ScriptedEdges {
        fn wait_for_falling_edge(&mut self, _timeout: Duration) -> Result<bool, InputError> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(InputError::PinRead {
                    pin: 5,
                    reason: "interrupt lost".to_string(),
                });
            }
            match self.edges.pop_front() {
                Some(edge) => Ok(edge),
                None => {
                    self.running.store(false, Ordering::Release);
                    Ok(false)
                }
            }
        }
    }

    fn monitor(
        detector: Option<Box<dyn EdgeDetector>>,
        running: Arc<AtomicBool>,
    ) -> (PowerButtonMonitor<Armed>, mpsc::Receiver<InputEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let monitor =
            PowerButtonMonitor::create(PowerButtonSettings::default(), detector, tx, running).arm();
        (monitor, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<InputEvent>) -> Vec<InputEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn two_presses_inside_window_queue_one_quit() {
        let (mut monitor, mut rx) = monitor(None, Arc::new(AtomicBool::new(true)));
        let now = Instant::now();

        assert!(monitor.handle_edge(now).unwrap());
        assert!(!monitor.handle_edge(now + Duration::from_millis(120)).unwrap());

        assert_eq!(drain(&mut rx), vec![InputEvent::Quit]);
    }

    #[test]
    fn presses_outside_window_each_queue_quit() {
        let (mut monitor, mut rx) = monitor(None, Arc::new(AtomicBool::new(true)));
        let now = Instant::now();

        assert!(monitor.handle_edge(now).unwrap());
        assert!(monitor.handle_edge(now + Duration::from_millis(250)).unwrap());

        assert_eq!(drain(&mut rx), vec![InputEvent::Quit, InputEvent::Quit]);
    }

    #[test]
    fn bouncing_contact_in_loop_queues_one_quit() {
        let running = Arc::new(AtomicBool::new(true));
        let edges = ScriptedEdges {
            failures: 0,
            edges: VecDeque::from(vec![true, true, false, true]),
            running: running.clone(),
        };
        let (mut monitor, mut rx) = monitor(Some(Box::new(edges)), running);

        monitor.run_monitor_loop();

        assert_eq!(drain(&mut rx), vec![InputEvent::Quit]);
    }

    #[test]
    fn failed_waits_are_retried() {
        let running = Arc::new(AtomicBool::new(true));
        let edges = ScriptedEdges {
            failures: 2,
            edges: VecDeque::from(vec![false, true]),
            running: running.clone(),
        };
        let (mut monitor, mut rx) = monitor(Some(Box::new(edges)), running);

        monitor.run_monitor_loop();

        assert_eq!(drain(&mut rx), vec![InputEvent::Quit]);
    }
}
