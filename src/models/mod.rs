pub mod geometry;
pub mod slot;
pub mod stroke;

pub use geometry::{Point, Rect, POINT_EPSILON};
pub use slot::{FocusTransition, LineSnapshot, Slot, SlotIndex, ValidationState};
pub use stroke::{Color, GlobalStrokeRecord, PathData, SlotId, Stroke, StrokeId, StrokeStyle};
