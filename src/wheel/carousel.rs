use tracing::debug;

use super::item::{CarouselItem, WheelGeometry, ZoomAction};
use super::model::{WheelError, WheelModel};
use super::resolver::closest_to_bottom;
use crate::catalog::Catalog;
use crate::config::WheelConfig;

/// The wheel model together with its items.
///
/// Items never hold the model; it is handed to them on every update.
#[derive(Debug, Clone)]
pub struct Carousel {
    model: WheelModel,
    items: Vec<CarouselItem>,
    geometry: WheelGeometry,
    zoom_window_deg: f64,
    zoom_factor: f32,
}

impl Carousel {
    pub fn new(
        catalog: &Catalog,
        geometry: WheelGeometry,
        config: &WheelConfig,
    ) -> Result<Self, WheelError> {
        let model = WheelModel::with_motion(
            catalog.len(),
            config.smoothing,
            config.snap_threshold_deg,
        )?;
        let items = catalog
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                CarouselItem::new(index, entry.label(), &model, config.thumbnail_size)
            })
            .collect();

        let mut carousel = Self {
            model,
            items,
            geometry,
            zoom_window_deg: config.zoom_window_deg,
            zoom_factor: config.zoom_factor,
        };
        carousel.reposition();
        Ok(carousel)
    }

    pub fn model(&self) -> &WheelModel {
        &self.model
    }

    pub fn items(&self) -> &[CarouselItem] {
        &self.items
    }

    pub fn geometry(&self) -> &WheelGeometry {
        &self.geometry
    }

    pub fn set_geometry(&mut self, geometry: WheelGeometry) {
        if self.geometry != geometry {
            self.geometry = geometry;
            self.reposition();
        }
    }

    /// Rotates the target by `delta` positions
    pub fn rotate(&mut self, delta: i64) {
        self.model.step(delta);
        debug!(
            "Highlight -> {} ({})",
            self.model.selected_index(),
            self.items[self.model.selected_index()].label()
        );
    }

    /// One fixed-rate frame: interpolate, reposition, then zoom the item at
    /// the bottom of the wheel
    pub fn tick(&mut self) {
        self.model.advance();
        self.reposition();

        let highlighted = self.highlighted().map(CarouselItem::catalog_index);
        for item in &mut self.items {
            let action = ZoomAction::for_item(
                Some(item.catalog_index()) == highlighted,
                &self.model,
                self.zoom_window_deg,
            );
            item.apply_zoom(action, self.zoom_factor);
        }
    }

    fn reposition(&mut self) {
        for item in &mut self.items {
            item.update(&self.model, &self.geometry);
        }
    }

    /// Item at the bottom of the wheel right now
    pub fn highlighted(&self) -> Option<&CarouselItem> {
        closest_to_bottom(&self.items, self.model.current_angle())
    }

    /// Catalog index that Confirm launches
    pub fn selected_index(&self) -> usize {
        self.model.selected_index()
    }

    /// Items back to front: everything behind the wheel's midline first,
    /// each half ordered by depth
    pub fn draw_order(&self) -> Vec<&CarouselItem> {
        let mut sorted: Vec<&CarouselItem> = self.items.iter().collect();
        sorted.sort_by(|a, b| a.view_depth().total_cmp(&b.view_depth()));

        let (back, front): (Vec<_>, Vec<_>) =
            sorted.into_iter().partition(|item| !item.is_front());
        back.into_iter().chain(front).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use egui::pos2;

    fn carousel(names: &[&str]) -> Result<Carousel, WheelError> {
        let catalog = Catalog::from_entries(
            names
                .iter()
                .map(|name| CatalogEntry::new(*name, format!("/apps/{name}")))
                .collect(),
        );
        let geometry = WheelGeometry {
            center: pos2(240.0, 135.0),
            radius_x: 150.0,
            radius_y: 40.0,
            vertical_offset: 40.0,
        };
        Carousel::new(&catalog, geometry, &WheelConfig::default())
    }

    #[test]
    fn empty_catalog_cannot_build_wheel() {
        assert!(matches!(carousel(&[]), Err(WheelError::NoItems)));
    }

    #[test]
    fn rotation_highlights_the_launch_target() {
        let mut wheel = carousel(&["pong", "snake", "tetris", "breakout"]).unwrap();

        for delta in [1, 1, -1, -1, -1, 1, 1, 1] {
            wheel.rotate(delta);
            for _ in 0..60 {
                wheel.tick();
            }
            let highlighted = wheel.highlighted().unwrap();
            assert_eq!(highlighted.catalog_index(), wheel.selected_index());
        }
    }

    #[test]
    fn right_moves_to_previous_catalog_entry() {
        let mut wheel = carousel(&["pong", "snake", "tetris"]).unwrap();
        assert_eq!(wheel.selected_index(), 0);

        wheel.rotate(1);
        assert_eq!(wheel.selected_index(), 2);
        wheel.rotate(-2);
        assert_eq!(wheel.selected_index(), 1);
    }

    #[test]
    fn highlighted_item_zooms_after_settling() {
        let mut wheel = carousel(&["pong", "snake", "tetris", "breakout"]).unwrap();
        wheel.rotate(1);
        for _ in 0..120 {
            wheel.tick();
        }

        let config = WheelConfig::default();
        let zoomed = (config.thumbnail_size * config.zoom_factor).trunc();
        for item in wheel.items() {
            if item.catalog_index() == wheel.selected_index() {
                assert_eq!(item.size(), zoomed);
            } else {
                assert_eq!(item.size(), config.thumbnail_size);
            }
        }
    }

    #[test]
    fn draw_order_puts_back_half_first() {
        let wheel = carousel(&["a", "b", "c", "d", "e", "f"]).unwrap();
        let order = wheel.draw_order();
        assert_eq!(order.len(), 6);

        let first_front = order.iter().position(|item| item.is_front()).unwrap();
        assert!(order[..first_front].iter().all(|item| !item.is_front()));
        assert!(order[first_front..].iter().all(|item| item.is_front()));
        assert!(order
            .windows(2)
            .all(|pair| pair[0].view_depth() <= pair[1].view_depth()));
    }
}
