//! Selection wheel: angular model, item placement and selection
//!
//! Per frame the model advances toward its target, every item is re-placed
//! from the new angle, and the item nearest the bottom of the wheel is
//! highlighted. At rest that item is always the one [`WheelModel::selected_index`]
//! names.

pub mod carousel;
pub mod frame_clock;
pub mod item;
pub mod model;
pub mod resolver;

pub use carousel::Carousel;
pub use frame_clock::FrameClock;
pub use item::{CarouselItem, WheelGeometry, ZoomAction};
pub use model::{WheelError, WheelModel};
pub use resolver::closest_to_bottom;
