use egui::{pos2, Pos2};

use super::model::WheelModel;

/// Items with at least this depth sit on the front half of the wheel
pub const FRONT_DEPTH: f32 = 2.0;

/// Screen-space ellipse the items ride on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelGeometry {
    pub center: Pos2,
    pub radius_x: f32,
    pub radius_y: f32,
    pub vertical_offset: f32,
}

impl WheelGeometry {
    /// Point on the ellipse for an absolute angle in radians
    pub fn point_at(&self, angle: f64) -> Pos2 {
        pos2(
            self.center.x + angle.cos() as f32 * self.radius_x,
            self.center.y + angle.sin() as f32 * self.radius_y + self.vertical_offset,
        )
    }
}

/// Grow/shrink animation of an item's thumbnail edge length, in pixels
#[derive(Debug, Clone, PartialEq)]
pub struct Zoom {
    base: f32,
    size: f32,
    grow: f32,
}

impl Zoom {
    const RATE: f32 = 0.2;

    pub fn new(base: f32) -> Self {
        Self {
            base,
            size: base,
            grow: 0.0,
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn base(&self) -> f32 {
        self.base
    }

    /// Proportional growth toward `factor` times the base size, set directly
    /// once within a pixel
    pub fn zoom_in(&mut self, factor: f32) {
        let target = (self.base * factor).trunc();
        self.approach(target);
    }

    pub fn zoom_out(&mut self) {
        self.approach(self.base);
    }

    fn approach(&mut self, target: f32) {
        let diff = target - self.size;
        if diff == 0.0 {
            return;
        }

        if diff.abs() > 1.0 {
            self.grow += diff * Self::RATE;
            self.size = self.base + self.grow.round();
        } else {
            self.size = target;
            self.grow = target - self.base;
        }
    }
}

/// What the selected-item zoom should do this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomAction {
    Grow,
    Hold,
    Shrink,
}

impl ZoomAction {
    /// The highlighted item grows once the wheel is within `window_deg` of its
    /// target and holds while further away; every other item shrinks.
    pub fn for_item(highlighted: bool, model: &WheelModel, window_deg: f64) -> Self {
        match (highlighted, model.remaining() < window_deg) {
            (false, _) => Self::Shrink,
            (true, true) => Self::Grow,
            (true, false) => Self::Hold,
        }
    }
}

/// One catalog entry placed on the wheel
#[derive(Debug, Clone)]
pub struct CarouselItem {
    catalog_index: usize,
    base_angle: f64,
    label: String,
    position: Pos2,
    view_depth: f32,
    zoom: Zoom,
}

impl CarouselItem {
    /// Places entry `catalog_index` at its fixed offset around the wheel.
    /// Offsets start a quarter turn in so index 0 begins at the bottom.
    pub fn new(catalog_index: usize, label: impl Into<String>, model: &WheelModel, size: f32) -> Self {
        let base_angle = (model.angle_increment() * catalog_index as f64 + 90.0).to_radians();
        Self {
            catalog_index,
            base_angle,
            label: label.into(),
            position: Pos2::ZERO,
            view_depth: 0.0,
            zoom: Zoom::new(size),
        }
    }

    pub fn catalog_index(&self) -> usize {
        self.catalog_index
    }

    /// Fixed offset around the wheel, radians
    pub fn base_angle(&self) -> f64 {
        self.base_angle
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Anchor point (bottom centre of the thumbnail) on screen
    pub fn position(&self) -> Pos2 {
        self.position
    }

    pub fn view_depth(&self) -> f32 {
        self.view_depth
    }

    pub fn is_front(&self) -> bool {
        self.view_depth >= FRONT_DEPTH
    }

    pub fn size(&self) -> f32 {
        self.zoom.size()
    }

    /// Absolute angle in radians for a wheel angle in degrees
    pub fn angle_at(&self, wheel_angle_deg: f64) -> f64 {
        self.base_angle + wheel_angle_deg.to_radians()
    }

    /// Recomputes position and depth from the wheel's current angle
    pub fn update(&mut self, model: &WheelModel, geometry: &WheelGeometry) {
        let angle = self.angle_at(model.current_angle());
        self.position = geometry.point_at(angle);
        self.view_depth = angle.sin() as f32 + 2.0;
    }

    pub fn apply_zoom(&mut self, action: ZoomAction, factor: f32) {
        match action {
            ZoomAction::Grow => self.zoom.zoom_in(factor),
            ZoomAction::Hold => {}
            ZoomAction::Shrink => self.zoom.zoom_out(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> WheelGeometry {
        WheelGeometry {
            center: pos2(240.0, 135.0),
            radius_x: 150.0,
            radius_y: 40.0,
            vertical_offset: 40.0,
        }
    }

    #[test]
    fn first_item_starts_at_bottom_front() {
        let model = WheelModel::new(4).unwrap();
        let mut item = CarouselItem::new(0, "Snake", &model, 56.0);
        item.update(&model, &geometry());

        assert!((item.position().x - 240.0).abs() < 1e-3);
        assert!((item.position().y - (135.0 + 40.0 + 40.0)).abs() < 1e-3);
        assert!((item.view_depth() - 3.0).abs() < 1e-6);
        assert!(item.is_front());
    }

    #[test]
    fn opposite_item_is_at_back() {
        let model = WheelModel::new(4).unwrap();
        let mut item = CarouselItem::new(2, "Tetris", &model, 56.0);
        item.update(&model, &geometry());

        assert!((item.view_depth() - 1.0).abs() < 1e-6);
        assert!(!item.is_front());
    }

    #[test]
    fn depth_stays_in_range_while_turning() {
        let mut model = WheelModel::new(5).unwrap();
        let mut items: Vec<_> = (0..5)
            .map(|i| CarouselItem::new(i, format!("app {i}"), &model, 56.0))
            .collect();
        model.set_target(3);

        for _ in 0..60 {
            model.advance();
            for item in &mut items {
                item.update(&model, &geometry());
                assert!((1.0..=3.0).contains(&item.view_depth()));
            }
        }
    }

    #[test]
    fn zoom_grows_in_steps_then_lands_exactly() {
        let mut zoom = Zoom::new(56.0);
        zoom.zoom_in(2.0);
        assert!(zoom.size() > 56.0 && zoom.size() < 112.0);

        for _ in 0..100 {
            zoom.zoom_in(2.0);
        }
        assert_eq!(zoom.size(), 112.0);

        for _ in 0..100 {
            zoom.zoom_out();
        }
        assert_eq!(zoom.size(), 56.0);
    }

    #[test]
    fn zoom_only_near_target() {
        let mut model = WheelModel::new(4).unwrap();
        assert_eq!(ZoomAction::for_item(true, &model, 6.0), ZoomAction::Grow);
        assert_eq!(ZoomAction::for_item(false, &model, 6.0), ZoomAction::Shrink);

        model.set_target(1);
        assert_eq!(ZoomAction::for_item(true, &model, 6.0), ZoomAction::Hold);
    }
}
