use eframe::egui::{self, Align2, Color32, FontId};

use super::common::UiColors;

const START_FRAMES: u32 = 240;
const FADE_IN_FROM: u32 = 180;
const LOGO_FRAMES: u32 = 180;
const FADE_OUT_FROM: u32 = 90;
const SKIPPED_LOGO_FRAMES: u32 = 60;
const ALPHA_STEP: u8 = 5;

/// Startup title: blank wait, fade in, hold, fade out. Counted in
/// fixed-rate ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splash {
    title: String,
    start_timer: u32,
    logo_timer: u32,
    alpha: u8,
}

impl Splash {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            start_timer: START_FRAMES,
            logo_timer: LOGO_FRAMES,
            alpha: 0,
        }
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    /// Finished once both timers ran out and the title has faded away
    pub fn is_done(&self) -> bool {
        self.start_timer == 0 && self.logo_timer == 0 && self.alpha == 0
    }

    pub fn tick(&mut self) {
        if self.start_timer > 0 {
            self.start_timer -= 1;
            if self.start_timer <= FADE_IN_FROM {
                self.alpha = self.alpha.saturating_add(ALPHA_STEP);
            }
        } else if self.logo_timer > 0 {
            self.logo_timer -= 1;
            if self.logo_timer <= FADE_OUT_FROM {
                self.alpha = self.alpha.saturating_sub(ALPHA_STEP);
            }
        }
    }

    /// Any key jumps straight to the fade-out
    pub fn skip(&mut self) {
        self.start_timer = 0;
        self.logo_timer = self.logo_timer.min(SKIPPED_LOGO_FRAMES);
    }

    pub fn render(&self, painter: &egui::Painter) {
        let rect = painter.clip_rect();
        painter.rect_filled(rect, 0.0, UiColors::SPLASH_BG);

        let color = Color32::from_white_alpha(self.alpha);
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            &self.title,
            FontId::proportional(rect.height() / 6.0),
            color,
        );
    }
}
