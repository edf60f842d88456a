use tracing::{debug, warn};

/// Fraction of the remaining angle closed per frame
pub const DEFAULT_SMOOTHING: f64 = 0.15;

/// Below this many degrees the wheel snaps onto its target
pub const DEFAULT_SNAP_THRESHOLD_DEG: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WheelError {
    #[error("Wheel has no items to select")]
    NoItems,
}

/// Brings any angle into [0, 360)
pub fn normalize_degrees(angle: f64) -> f64 {
    let normalized = angle.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Signed shortest rotation from `from` to `to`, in (-180, 180]
pub fn shortest_delta(from: f64, to: f64) -> f64 {
    let delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

fn motion_smoothing(smoothing: f64) -> f64 {
    if smoothing.is_finite() {
        smoothing.clamp(f64::EPSILON, 1.0)
    } else {
        warn!("Smoothing {} is not a number, using {}", smoothing, DEFAULT_SMOOTHING);
        DEFAULT_SMOOTHING
    }
}

fn motion_snap_threshold(snap_threshold: f64) -> f64 {
    if snap_threshold.is_finite() && snap_threshold > 0.0 {
        snap_threshold
    } else {
        warn!(
            "Snap threshold {} would never settle, using {}",
            snap_threshold, DEFAULT_SNAP_THRESHOLD_DEG
        );
        DEFAULT_SNAP_THRESHOLD_DEG
    }
}

/// Angular state of the carousel.
///
/// The target is set instantly by input; the current angle chases it once per
/// frame with first-order smoothing and snaps exactly onto it at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct WheelModel {
    item_count: usize,
    angle_increment: f64,
    target_index: usize,
    target_angle: f64,
    current_angle: f64,
    smoothing: f64,
    snap_threshold: f64,
}

impl WheelModel {
    pub fn new(item_count: usize) -> Result<Self, WheelError> {
        Self::with_motion(item_count, DEFAULT_SMOOTHING, DEFAULT_SNAP_THRESHOLD_DEG)
    }

    /// Builds a model with custom motion. `smoothing` is clamped to (0, 1] and
    /// the snap threshold must be positive, so the wheel always comes to rest.
    /// Values that are not finite, or a threshold of zero or less, fall back to
    /// the defaults.
    pub fn with_motion(
        item_count: usize,
        smoothing: f64,
        snap_threshold: f64,
    ) -> Result<Self, WheelError> {
        if item_count == 0 {
            return Err(WheelError::NoItems);
        }

        Ok(Self {
            item_count,
            angle_increment: 360.0 / item_count as f64,
            target_index: 0,
            target_angle: 0.0,
            current_angle: 0.0,
            smoothing: motion_smoothing(smoothing),
            snap_threshold: motion_snap_threshold(snap_threshold),
        })
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn angle_increment(&self) -> f64 {
        self.angle_increment
    }

    pub fn target_index(&self) -> usize {
        self.target_index
    }

    pub fn target_angle(&self) -> f64 {
        self.target_angle
    }

    pub fn current_angle(&self) -> f64 {
        self.current_angle
    }

    /// Places the wheel at `angle` without animating
    pub fn set_current_angle(&mut self, angle: f64) {
        self.current_angle = normalize_degrees(angle);
    }

    /// Sets the target from any index, wrapping it into [0, item_count)
    pub fn set_target(&mut self, index: i64) {
        self.target_index = index.rem_euclid(self.item_count as i64) as usize;
        self.target_angle = self.angle_increment * self.target_index as f64;
        debug!(
            "Wheel target -> index {} ({:.1} deg)",
            self.target_index, self.target_angle
        );
    }

    /// Moves the target by `delta` positions
    pub fn step(&mut self, delta: i64) {
        self.set_target(self.target_index as i64 + delta);
    }

    /// One frame of motion toward the target
    pub fn advance(&mut self) {
        let delta = shortest_delta(self.current_angle, self.target_angle);

        if delta.abs() > self.snap_threshold {
            self.current_angle += delta * self.smoothing;
        } else {
            self.current_angle = self.target_angle;
        }

        self.current_angle = normalize_degrees(self.current_angle);
    }

    /// Degrees still to travel, always the shorter way round
    pub fn remaining(&self) -> f64 {
        shortest_delta(self.current_angle, self.target_angle).abs()
    }

    pub fn is_settled(&self) -> bool {
        self.current_angle == self.target_angle
    }

    /// Catalog index highlighted for the current target.
    ///
    /// The wheel turns opposite to index order, so the target index is
    /// reflected. Left/right highlight the wrong neighbour if this changes.
    pub fn selected_index(&self) -> usize {
        (self.item_count - 1 - self.target_index + 1) % self.item_count
    }
}
