//! Ink engine for handwritten, multi-line math answers.
//!
//! Each line of an answer is a slot with its own drawing surface. The engine
//! keeps one global undo history across slots, erases across line borders,
//! debounces per-slot recognition, publishes line snapshots on focus changes
//! and places validation underlines.

pub mod engine;
pub mod erase;
pub mod history;
pub mod layout;
pub mod lines;
pub mod models;
pub mod recognition;
pub mod registry;
pub mod settings;
pub mod surface;
pub mod transform;
pub mod utils;
pub mod validation;

pub use engine::{EngineConfig, InkEngine, InkHost, NoopHost, RecognitionApplied};
pub use erase::{EraseCoordinator, EraseOutcome};
pub use history::{HistoryAction, HistoryChange, HistoryManager, Operation, OperationKind};
pub use lines::{LineStateEmitter, LinesDataChangedEvent};
pub use models::{
    Color, FocusTransition, LineSnapshot, PathData, Point, Rect, Slot, SlotId, SlotIndex, Stroke,
    StrokeId, StrokeStyle, ValidationState,
};
pub use recognition::{Recognition, RecognitionResult, Recognizer, StrokeBundle};
pub use settings::ConfigStore;
pub use surface::{DrawableSurface, MemorySurface};
pub use utils::init_logging;
pub use validation::{CompactedLines, Decoration, Underline, ValidationReport, Validator};
