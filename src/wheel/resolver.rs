use std::f64::consts::{FRAC_PI_2, PI, TAU};

use super::item::CarouselItem;

/// Fixed "selected" position at the bottom of the wheel, radians
pub const BOTTOM_ANGLE: f64 = FRAC_PI_2;

/// Distance from an absolute angle to the bottom position, never above pi
pub fn distance_to_bottom(angle: f64) -> f64 {
    let diff = (angle.rem_euclid(TAU) - BOTTOM_ANGLE).abs();
    if diff > PI {
        TAU - diff
    } else {
        diff
    }
}

/// The item geometrically closest to the bottom of the wheel at
/// `current_angle` degrees. Exact ties keep the first item found.
pub fn closest_to_bottom(items: &[CarouselItem], current_angle: f64) -> Option<&CarouselItem> {
    let mut closest = None;
    let mut min_diff = f64::INFINITY;

    for item in items {
        let diff = distance_to_bottom(item.angle_at(current_angle));
        if diff < min_diff {
            min_diff = diff;
            closest = Some(item);
        }
    }

    closest
}
