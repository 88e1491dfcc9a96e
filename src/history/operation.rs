use serde::{Deserialize, Serialize};

use crate::models::{GlobalStrokeRecord, PathData, SlotId, Stroke, StrokeId};

/// Stroke state of one slot captured for undo/redo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotState {
    pub slot: SlotId,
    pub strokes: PathData,
}

/// One undoable unit on the global timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    StrokeAdd {
        slot: SlotId,
        stroke_id: StrokeId,
    },
    /// Erase that may span several slots; `before` holds every intersected
    /// slot as it stood before the gesture.
    CrossCanvasErase {
        slots: Vec<SlotId>,
        before: Vec<SlotState>,
    },
    ClearAll {
        before: Vec<SlotState>,
    },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::StrokeAdd { .. } => OperationKind::StrokeAdd,
            Operation::CrossCanvasErase { .. } => OperationKind::CrossCanvasErase,
            Operation::ClearAll { .. } => OperationKind::ClearAll,
        }
    }

    /// Slots whose stroke sets this operation touches.
    pub fn slots(&self) -> Vec<SlotId> {
        match self {
            Operation::StrokeAdd { slot, .. } => vec![*slot],
            Operation::CrossCanvasErase { slots, .. } => slots.clone(),
            Operation::ClearAll { before } => before.iter().map(|state| state.slot).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    StrokeAdd,
    CrossCanvasErase,
    ClearAll,
}

/// Inverse recorded at undo time, consumed by redo.
#[derive(Debug, Clone, PartialEq)]
pub enum RedoEntry {
    Stroke {
        slot: SlotId,
        stroke: Stroke,
        record: Option<GlobalStrokeRecord>,
    },
    /// Re-imports `after` (the state right before the undo) and puts
    /// `operation` back on the undo timeline.
    Restore {
        operation: Operation,
        after: Vec<SlotState>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Undo,
    Redo,
}

/// Result of an undo or redo step, used to refresh derived slot state.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryChange {
    pub action: HistoryAction,
    pub kind: OperationKind,
    pub slots: Vec<SlotId>,
    pub added: Vec<Stroke>,
    pub removed: Vec<(SlotId, StrokeId)>,
}
