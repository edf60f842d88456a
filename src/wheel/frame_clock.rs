use std::time::{Duration, Instant};

/// Turns wall time into whole fixed-rate ticks.
///
/// The wheel's smoothing is per tick, so repaints caused by input or window
/// events must not speed the animation up.
#[derive(Debug, Clone)]
pub struct FrameClock {
    period: Duration,
    max_ticks: u32,
    last: Option<Instant>,
    backlog: Duration,
}

impl FrameClock {
    /// Highest supported rate; keeps the period at a whole microsecond or more
    pub const MAX_RATE_HZ: u32 = 1000;

    pub fn new(rate_hz: u32, max_ticks: u32) -> Self {
        Self {
            period: Duration::from_secs(1) / rate_hz.clamp(1, Self::MAX_RATE_HZ),
            max_ticks: max_ticks.max(1),
            last: None,
            backlog: Duration::ZERO,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of ticks due at `now`. The first call yields one tick; long
    /// stalls (e.g. while a child app runs) are capped and then forgotten.
    pub fn ticks(&mut self, now: Instant) -> u32 {
        let Some(last) = self.last.replace(now) else {
            return 1;
        };

        self.backlog += now.saturating_duration_since(last);
        let due = (self.backlog.as_nanos() / self.period.as_nanos()) as u64;
        if due >= u64::from(self.max_ticks) {
            self.backlog = Duration::ZERO;
            return self.max_ticks;
        }

        self.backlog -= self.period * due as u32;
        due as u32
    }

    /// Forgets accumulated time, e.g. after returning from a launched app
    pub fn reset(&mut self) {
        self.last = None;
        self.backlog = Duration::ZERO;
    }
}
