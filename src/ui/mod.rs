//! # Launcher User Interface
//!
//! eframe application hosting the splash screen and the wheel screen.
//!
//! Each frame runs in a fixed order:
//!
//! 1. `raw_input_hook` drains the hardware queue and merges it ahead of the
//!    window's own key events
//! 2. `update` turns the merged events into wheel actions
//! 3. the wheel advances by as many fixed-rate ticks as are due
//! 4. the screen is painted back to front
//!
//! All wheel state lives on this thread; the samplers only ever talk to it
//! through the queue.

pub mod common;
pub mod splash;

use eframe::egui::{
    self, pos2, vec2, Align2, Color32, FontId, Frame, Rect, Shape, Stroke, TextureHandle,
    TextureOptions,
};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::{LauncherConfig, WheelConfig};
use crate::input::{EventMerger, InputEvent, LogicalKey};
use crate::launcher::Launcher;
use crate::status::clock_text;
use crate::thumbnail;
use crate::wheel::{Carousel, FrameClock, WheelGeometry};

use self::common::{notice_frame, FpsCounter, UiColors};
use self::splash::Splash;

/// Most ticks replayed in one frame after a stall
const MAX_TICKS_PER_FRAME: u32 = 4;
const BANNER_HEIGHT: f32 = 20.0;
const TEXT_SIZE: f32 = 16.0;

/// What a merged input event asks the wheel screen to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelAction {
    Rotate(i64),
    Launch,
    Quit,
}

impl WheelAction {
    /// Key-downs drive the wheel; key-ups are ignored
    pub fn from_event(event: InputEvent) -> Option<Self> {
        match event {
            InputEvent::Quit => Some(Self::Quit),
            InputEvent::KeyDown(key) => Some(match key {
                LogicalKey::Left | LogicalKey::Up => Self::Rotate(-1),
                LogicalKey::Right | LogicalKey::Down => Self::Rotate(1),
                LogicalKey::Confirm => Self::Launch,
                LogicalKey::Cancel => Self::Quit,
            }),
            InputEvent::KeyUp(_) => None,
        }
    }
}

/// Wheel geometry for the available screen area, scaled from the layout size
fn wheel_geometry(rect: Rect, scale: f32, wheel: &WheelConfig) -> WheelGeometry {
    WheelGeometry {
        center: rect.center(),
        radius_x: wheel.radius_x * scale,
        radius_y: wheel.radius_y * scale,
        vertical_offset: wheel.vertical_offset * scale,
    }
}

pub struct CarouselApp {
    config: LauncherConfig,
    catalog: Catalog,
    /// `None` when the catalog is empty
    carousel: Option<Carousel>,
    thumbnails: Vec<TextureHandle>,
    merger: EventMerger,
    frame_events: Vec<InputEvent>,
    clock: FrameClock,
    splash: Option<Splash>,
    launcher: Launcher,
    network: watch::Receiver<bool>,
    fps: FpsCounter,
}

impl CarouselApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: LauncherConfig,
        catalog: Catalog,
        merger: EventMerger,
        network: watch::Receiver<bool>,
    ) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);

        let layout = Rect::from_min_size(
            pos2(0.0, 0.0),
            vec2(config.screen.width, config.screen.height),
        );
        let carousel = match Carousel::new(
            &catalog,
            wheel_geometry(layout, 1.0, &config.wheel),
            &config.wheel,
        ) {
            Ok(carousel) => Some(carousel),
            Err(e) => {
                warn!("{}, showing empty screen", e);
                None
            }
        };

        let edge = (config.wheel.thumbnail_size * config.wheel.zoom_factor)
            .round()
            .max(1.0) as u32;
        let thumbnails = catalog
            .entries()
            .iter()
            .map(|entry| {
                let image =
                    thumbnail::load_or_fallback(&entry.dir().join(&config.thumbnail_name), edge);
                cc.egui_ctx
                    .load_texture(entry.name(), image, TextureOptions::LINEAR)
            })
            .collect();

        let splash = config
            .splash
            .enabled
            .then(|| Splash::new(config.splash.title.clone()));

        info!(
            "Launcher ready with {} applications, splash {}",
            catalog.len(),
            if splash.is_some() { "on" } else { "off" }
        );

        Self {
            clock: FrameClock::new(config.frame_rate, MAX_TICKS_PER_FRAME),
            launcher: Launcher::from_config(&config),
            config,
            catalog,
            carousel,
            thumbnails,
            merger,
            frame_events: Vec::new(),
            splash,
            network,
            fps: FpsCounter::default(),
        }
    }

    fn quit(ctx: &egui::Context) {
        info!("Quit requested");
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    /// Splash frame: any key skips ahead, Cancel and quit still close
    fn update_splash(&mut self, ctx: &egui::Context, events: &[InputEvent], ticks: u32) {
        let Some(splash) = self.splash.as_mut() else {
            return;
        };

        for event in events {
            match event {
                InputEvent::Quit | InputEvent::KeyDown(LogicalKey::Cancel) => {
                    Self::quit(ctx);
                    return;
                }
                InputEvent::KeyDown(_) => splash.skip(),
                InputEvent::KeyUp(_) => {}
            }
        }

        for _ in 0..ticks {
            splash.tick();
        }

        egui::CentralPanel::default()
            .frame(Frame::NONE)
            .show(ctx, |ui| splash.render(ui.painter()));

        if splash.is_done() {
            debug!("Splash finished");
            self.splash = None;
        }
    }

    fn update_wheel(&mut self, ctx: &egui::Context, events: &[InputEvent], ticks: u32) {
        for event in events {
            match WheelAction::from_event(*event) {
                Some(WheelAction::Quit) => {
                    Self::quit(ctx);
                    return;
                }
                Some(WheelAction::Rotate(delta)) => {
                    if let Some(carousel) = self.carousel.as_mut() {
                        carousel.rotate(delta);
                    }
                }
                Some(WheelAction::Launch) => {
                    if self.launch_selected() {
                        Self::quit(ctx);
                        return;
                    }
                }
                None => {}
            }
        }

        if let Some(carousel) = self.carousel.as_mut() {
            for _ in 0..ticks {
                carousel.tick();
            }
        }

        egui::CentralPanel::default()
            .frame(Frame::NONE.fill(UiColors::MAIN_BG))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let scale = (rect.width() / self.config.screen.width)
                    .min(rect.height() / self.config.screen.height);

                if let Some(carousel) = self.carousel.as_mut() {
                    carousel.set_geometry(wheel_geometry(rect, scale, &self.config.wheel));
                }
                match &self.carousel {
                    Some(carousel) => render_wheel(ui.painter(), carousel, &self.thumbnails, scale),
                    None => self.render_empty(ui),
                }
                self.render_banners(ui.painter(), rect, scale);
            });
    }

    /// Runs the selected entry to completion. The wheel is not touched while
    /// the child runs; keys queued meanwhile belonged to the child and are
    /// dropped. Returns true if the power button was pressed during the run.
    fn launch_selected(&mut self) -> bool {
        let Some(carousel) = self.carousel.as_ref() else {
            return false;
        };
        let Some(entry) = self.catalog.get(carousel.selected_index()) else {
            warn!("Selected index {} outside catalog", carousel.selected_index());
            return false;
        };

        self.launcher.run_logged(entry);

        let stale = self.merger.drain();
        if !stale.is_empty() {
            debug!("Discarded {} events queued during launch", stale.len());
        }
        self.clock.reset();

        let quit = quit_requested(&stale);
        if quit {
            info!("Power button pressed while {} was running", entry.name());
        }
        quit
    }

    fn render_empty(&self, ui: &mut egui::Ui) {
        ui.centered_and_justified(|ui| {
            notice_frame().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.colored_label(UiColors::TEXT, "No applications found");
                    ui.label(format!(
                        "Add a folder with {} to {}",
                        self.config.entry_point,
                        self.config.apps_dir.display()
                    ));
                });
            });
        });
    }

    fn render_banners(&self, painter: &egui::Painter, rect: Rect, scale: f32) {
        let height = BANNER_HEIGHT * scale;
        let font = FontId::proportional(TEXT_SIZE * scale);
        let top = Rect::from_min_size(rect.min, vec2(rect.width(), height));
        let bottom = Rect::from_min_size(
            pos2(rect.min.x, rect.max.y - height),
            vec2(rect.width(), height),
        );
        painter.rect_filled(top, 0.0, UiColors::BANNER);
        painter.rect_filled(bottom, 0.0, UiColors::BANNER);

        let clock = clock_text(&chrono::Local::now());
        painter.text(
            top.right_center() - vec2(8.0 * scale, 0.0),
            Align2::RIGHT_CENTER,
            format!("{}  {}", self.fps.fps(), clock),
            font.clone(),
            UiColors::TEXT,
        );

        let network = if *self.network.borrow() {
            UiColors::ACTIVE
        } else {
            UiColors::INACTIVE
        };
        painter.circle_filled(
            top.left_center() + vec2(12.0 * scale, 0.0),
            5.0 * scale,
            network,
        );

        if let Some(item) = self.carousel.as_ref().and_then(Carousel::highlighted) {
            painter.text(
                bottom.center(),
                Align2::CENTER_CENTER,
                item.label(),
                font,
                UiColors::TEXT,
            );
        }
    }
}

/// Ellipse, then items back to front with a spoke each
fn render_wheel(
    painter: &egui::Painter,
    carousel: &Carousel,
    thumbnails: &[TextureHandle],
    scale: f32,
) {
    let geometry = carousel.geometry();
    painter.add(Shape::ellipse_filled(
        geometry.center + vec2(0.0, geometry.vertical_offset / 2.0),
        vec2(geometry.radius_x, geometry.radius_y),
        UiColors::WHEEL,
    ));

    let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
    for item in carousel.draw_order() {
        let size = item.size() * scale;
        let anchor = item.position();
        let rect = Rect::from_min_size(pos2(anchor.x - size / 2.0, anchor.y - size), vec2(size, size));

        painter.line_segment([geometry.center, rect.center()], Stroke::new(1.0, UiColors::SPOKE));
        if let Some(texture) = thumbnails.get(item.catalog_index()) {
            painter.image(texture.id(), rect, uv, Color32::WHITE);
        }
    }
}

impl eframe::App for CarouselApp {
    /// Merges the hardware queue into this frame's events ahead of the
    /// window's key events
    fn raw_input_hook(&mut self, _ctx: &egui::Context, raw_input: &mut egui::RawInput) {
        let native = raw_input.events.iter().filter_map(InputEvent::from_egui);
        self.frame_events = self.merger.merge_frame(native);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.fps.record(now);
        let ticks = self.clock.ticks(now);
        let events = std::mem::take(&mut self.frame_events);

        for event in &events {
            debug!("Input: {}", event);
        }

        if self.splash.is_some() {
            self.update_splash(ctx, &events, ticks);
        } else {
            self.update_wheel(ctx, &events, ticks);
        }

        ctx.request_repaint_after(self.clock.period());
    }
}

/// Whether events queued during a launch include a shutdown request
fn quit_requested(stale: &[InputEvent]) -> bool {
    stale.iter().any(|event| matches!(event, InputEvent::Quit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_keys_rotate_in_pairs() {
        let rotate = |key| WheelAction::from_event(InputEvent::KeyDown(key));
        assert_eq!(rotate(LogicalKey::Left), Some(WheelAction::Rotate(-1)));
        assert_eq!(rotate(LogicalKey::Up), Some(WheelAction::Rotate(-1)));
        assert_eq!(rotate(LogicalKey::Right), Some(WheelAction::Rotate(1)));
        assert_eq!(rotate(LogicalKey::Down), Some(WheelAction::Rotate(1)));
    }

    #[test]
    fn confirm_launches_and_cancel_quits() {
        assert_eq!(
            WheelAction::from_event(InputEvent::KeyDown(LogicalKey::Confirm)),
            Some(WheelAction::Launch)
        );
        assert_eq!(
            WheelAction::from_event(InputEvent::KeyDown(LogicalKey::Cancel)),
            Some(WheelAction::Quit)
        );
        assert_eq!(
            WheelAction::from_event(InputEvent::Quit),
            Some(WheelAction::Quit)
        );
    }

    #[test]
    fn key_releases_do_nothing() {
        assert_eq!(
            WheelAction::from_event(InputEvent::KeyUp(LogicalKey::Confirm)),
            None
        );
    }

    #[test]
    fn quit_queued_during_launch_is_kept() {
        let stale = [
            InputEvent::KeyDown(LogicalKey::Left),
            InputEvent::Quit,
            InputEvent::KeyUp(LogicalKey::Left),
        ];
        assert!(quit_requested(&stale));
    }

    #[test]
    fn child_keys_queued_during_launch_are_dropped() {
        let stale = [
            InputEvent::KeyDown(LogicalKey::Cancel),
            InputEvent::KeyUp(LogicalKey::Cancel),
            InputEvent::KeyDown(LogicalKey::Confirm),
        ];
        assert!(!quit_requested(&stale));
        assert!(!quit_requested(&[]));
    }

    #[test]
    fn geometry_scales_with_screen() {
        let config = WheelConfig::default();
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(960.0, 540.0));
        let geometry = wheel_geometry(rect, 2.0, &config);

        assert_eq!(geometry.center, pos2(480.0, 270.0));
        assert_eq!(geometry.radius_x, config.radius_x * 2.0);
        assert_eq!(geometry.vertical_offset, config.vertical_offset * 2.0);
    }
}
