use crate::lines::LinesDataChangedEvent;
use crate::models::{PathData, SlotIndex, Stroke, StrokeId};
use crate::validation::Decoration;

/// Callbacks the engine fires into its host. Every method defaults to a
/// no-op so hosts implement only what they listen to.
///
/// Callbacks run while the engine holds its state lock; they must not block
/// on engine calls.
pub trait InkHost: Send + Sync {
    /// Fired after every committed mutation, recognition update or focus
    /// transition.
    fn on_lines_data_change(&self, _event: &LinesDataChangedEvent) {}

    /// Fired when a line's recognized text changes, including to empty.
    fn on_expression_updated(&self, _index: SlotIndex, _symbolic: &str) {}

    fn on_stroke_added(&self, _index: SlotIndex, _stroke: &Stroke) {}

    fn on_stroke_removed(&self, _index: SlotIndex, _stroke_id: StrokeId) {}

    /// Strokes an erase gesture removed from one line.
    fn on_erase_action(&self, _index: SlotIndex, _erased: &PathData) {}

    fn on_decorations_changed(&self, _decorations: &[Decoration]) {}
}

/// Host that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl InkHost for NoopHost {}
