//! Input Handle - lifecycle of the two GPIO samplers
//!
//! Spawns the pin poller and the power button monitor on dedicated threads,
//! both pushing into the queue the frame loop drains. Hardware that cannot be
//! opened is logged once and the affected sampler idles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::pin_poller::{PinBackend, PinPoller, PollerSettings, RppalPins};
use super::power_button::{EdgeDetector, PowerButtonMonitor, PowerButtonSettings, RppalEdge};
use super::{InputError, InputEvent, LogicalKey};
use crate::config::InputConfig;

/// Settings for both samplers, usually built from [`InputConfig`]
#[derive(Clone, Debug, Default)]
pub struct InputSettings {
    pub poller: PollerSettings,
    pub power_button: PowerButtonSettings,
}

impl From<&InputConfig> for InputSettings {
    fn from(config: &InputConfig) -> Self {
        let pins = &config.pins;
        Self {
            poller: PollerSettings {
                pin_map: vec![
                    (pins.up, LogicalKey::Up),
                    (pins.down, LogicalKey::Down),
                    (pins.left, LogicalKey::Left),
                    (pins.right, LogicalKey::Right),
                    (pins.confirm, LogicalKey::Confirm),
                    (pins.cancel, LogicalKey::Cancel),
                ],
                poll_interval: Duration::from_millis(config.poll_interval_ms),
                ..PollerSettings::default()
            },
            power_button: PowerButtonSettings {
                pin: config.power_button_pin,
                debounce: Duration::from_millis(config.debounce_ms),
                ..PowerButtonSettings::default()
            },
        }
    }
}

/// One background sampler thread and its running flag
#[derive(Debug)]
struct SamplerThread {
    name: &'static str,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SamplerThread {
    fn spawn<F>(name: &'static str, running: Arc<AtomicBool>, body: F) -> Result<Self, InputError>
    where
        F: FnOnce() + Send + 'static,
    {
        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(body)
            .map_err(|e| InputError::Spawn(e.to_string()))?;
        debug!("Spawned sampler thread {}", name);

        Ok(Self {
            name,
            running,
            thread: Some(thread),
        })
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Sampler thread {} panicked", self.name);
            } else {
                debug!("Sampler thread {} joined", self.name);
            }
        }
    }
}

/// Handle for both input samplers.
///
/// Pins are claimed by [`InputHandle::spawn`] on the calling thread, then
/// moved into the sampler threads and released when those threads finish.
/// [`InputHandle::shutdown`] must run before exit.
#[derive(Debug)]
pub struct InputHandle {
    poller: SamplerThread,
    power_button: SamplerThread,
}

impl InputHandle {
    /// Opens the GPIO pins through rppal and spawns both samplers
    pub fn spawn(
        settings: InputSettings,
        sender: mpsc::Sender<InputEvent>,
    ) -> Result<Self, InputError> {
        info!("Initializing input samplers with settings: {:?}", settings);

        let pins = settings.poller.pin_map.iter().map(|(pin, _)| *pin);
        let backend: Option<Box<dyn PinBackend>> = match RppalPins::open(pins) {
            Ok(pins) => Some(Box::new(pins)),
            Err(e) => {
                warn!("Button pad unavailable: {}", e);
                None
            }
        };

        let detector: Option<Box<dyn EdgeDetector>> =
            match RppalEdge::open(settings.power_button.pin) {
                Ok(edge) => Some(Box::new(edge)),
                Err(e) => {
                    warn!("Power button unavailable: {}", e);
                    None
                }
            };

        Self::spawn_with(settings, backend, detector, sender)
    }

    /// Spawns both samplers over the given hardware, `None` meaning idle
    pub fn spawn_with(
        settings: InputSettings,
        backend: Option<Box<dyn PinBackend>>,
        detector: Option<Box<dyn EdgeDetector>>,
        sender: mpsc::Sender<InputEvent>,
    ) -> Result<Self, InputError> {
        let poller_running = Arc::new(AtomicBool::new(true));
        let poller = PinPoller::create(
            settings.poller,
            backend,
            sender.clone(),
            poller_running.clone(),
        );
        let poller = SamplerThread::spawn("pin-poller", poller_running, move || {
            poller.initialize().run_polling_loop();
        })?;

        let monitor_running = Arc::new(AtomicBool::new(true));
        let monitor = PowerButtonMonitor::create(
            settings.power_button,
            detector,
            sender,
            monitor_running.clone(),
        );
        let power_button = match SamplerThread::spawn("power-button", monitor_running, move || {
            monitor.arm().run_monitor_loop();
        }) {
            Ok(thread) => thread,
            Err(e) => {
                let mut poller = poller;
                poller.stop();
                poller.join();
                return Err(e);
            }
        };

        info!("Input samplers started");
        Ok(Self {
            poller,
            power_button,
        })
    }

    /// Clears both running flags without waiting
    pub fn stop(&self) {
        self.poller.stop();
        self.power_button.stop();
    }

    /// Waits for both sampler threads to finish
    pub fn join(&mut self) {
        self.poller.join();
        self.power_button.join();
    }

    pub fn shutdown(mut self) {
        info!("Stopping input samplers");
        self.stop();
        self.join();
        info!("Input samplers stopped, GPIO released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LauncherConfig;

    #[test]
    fn settings_follow_config() {
        let config = LauncherConfig::default();
        let settings = InputSettings::from(&config.input);

        assert_eq!(settings.poller.pin_map.len(), 6);
        assert!(settings
            .poller
            .pin_map
            .contains(&(27, LogicalKey::Left)));
        assert_eq!(settings.poller.poll_interval, Duration::from_millis(10));
        assert_eq!(settings.power_button.pin, 5);
        assert_eq!(settings.power_button.debounce, Duration::from_millis(200));
    }

    #[test]
    fn idle_samplers_stop_and_join() {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = InputHandle::spawn_with(InputSettings::default(), None, None, tx).unwrap();

        handle.shutdown();

        assert!(rx.try_recv().is_err());
    }

    // Reports when the sampler thread drops the pins it was handed
    #[derive(Debug)]
    struct ReleaseTracker(Arc<AtomicBool>);

    impl PinBackend for ReleaseTracker {
        fn read(&mut self, _pin: u8) -> Result<rppal::gpio::Level, InputError> {
            Ok(rppal::gpio::Level::High)
        }
    }

    impl Drop for ReleaseTracker {
        fn drop(&mut self) {
            self.0.store(true, Ordering::Release);
        }
    }

    #[test]
    fn pins_are_released_when_samplers_finish() {
        let released = Arc::new(AtomicBool::new(false));
        let (tx, _rx) = mpsc::channel(8);
        let handle = InputHandle::spawn_with(
            InputSettings::default(),
            Some(Box::new(ReleaseTracker(released.clone()))),
            None,
            tx,
        )
        .unwrap();
        assert!(!released.load(Ordering::Acquire));

        handle.shutdown();

        assert!(released.load(Ordering::Acquire));
    }
}

