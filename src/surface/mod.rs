//! Drawable surface contract.
//!
//! A surface owns the stroke list of exactly one slot. The engine drives it
//! through this trait and never holds references into the rendering layer;
//! hosts that render elsewhere implement the trait over their own canvas.

pub mod memory;

pub use memory::MemorySurface;

use crate::models::{PathData, Point, Rect, Stroke, StrokeId};

pub trait DrawableSurface: Send {
    /// Appends a stroke whose id was issued by the engine.
    fn add_stroke(&mut self, stroke: Stroke) -> StrokeId;

    fn remove_stroke(&mut self, id: StrokeId) -> Option<Stroke>;

    fn export_strokes(&self) -> PathData;

    /// Replaces the surface contents with `data`, keeping stroke ids.
    fn import_strokes(&mut self, data: PathData);

    fn bounds(&self) -> Option<Rect>;

    fn set_erase_mode(&mut self, enabled: bool);

    /// Removes every stroke touched by the eraser path (surface-local
    /// coordinates) and returns what was removed.
    fn erase_path(&mut self, path: &[Point], radius: f64) -> Vec<Stroke>;

    fn stroke_count(&self) -> usize {
        self.export_strokes().len()
    }

    fn is_empty(&self) -> bool {
        self.stroke_count() == 0
    }
}
