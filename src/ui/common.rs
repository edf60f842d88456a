//! Shared colors and small helpers for the launcher screens.

use eframe::egui::{Color32, Frame, Stroke};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Launcher palette, darkest to lightest, plus status colors
pub struct UiColors;

impl UiColors {
    /// Splash background (RGB: 30, 30, 30)
    pub const SPLASH_BG: Color32 = Color32::from_rgb(30, 30, 30);

    /// Wheel screen background (RGB: 40, 40, 40)
    pub const MAIN_BG: Color32 = Color32::from_rgb(40, 40, 40);

    /// Wheel ellipse (RGB: 60, 60, 60)
    pub const WHEEL: Color32 = Color32::from_rgb(60, 60, 60);

    /// Top and bottom banners (RGB: 70, 70, 70)
    pub const BANNER: Color32 = Color32::from_rgb(70, 70, 70);

    /// Spokes from the wheel centre to each item (RGB: 100, 100, 100)
    pub const SPOKE: Color32 = Color32::from_rgb(100, 100, 100);

    pub const TEXT: Color32 = Color32::WHITE;

    /// Network connected (RGB: 50, 200, 20)
    pub const ACTIVE: Color32 = Color32::from_rgb(50, 200, 20);

    /// Network disconnected (RGB: 200, 50, 20)
    pub const INACTIVE: Color32 = Color32::from_rgb(200, 50, 20);
}

/// Bordered panel used for the empty-catalog notice
pub fn notice_frame() -> Frame {
    Frame::new()
        .stroke(Stroke::new(1.0, UiColors::SPOKE))
        .fill(UiColors::BANNER)
        .inner_margin(12)
        .outer_margin(2)
}

/// Rendered frames over the last second
#[derive(Debug, Default)]
pub struct FpsCounter {
    frames: VecDeque<Instant>,
}

impl FpsCounter {
    const WINDOW: Duration = Duration::from_secs(1);

    pub fn record(&mut self, now: Instant) {
        self.frames.push_back(now);
        while let Some(oldest) = self.frames.front() {
            if now.saturating_duration_since(*oldest) > Self::WINDOW {
                self.frames.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn fps(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_counts_last_second_only() {
        let mut counter = FpsCounter::default();
        let start = Instant::now();
        for i in 0..30 {
            counter.record(start + Duration::from_millis(i * 50));
        }
        // 0..=1450 ms recorded, only 450..=1450 remain in the window
        assert_eq!(counter.fps(), 21);
    }
}
