pub mod manager;
pub mod operation;

pub use manager::{capture, HistoryManager};
pub use operation::{
    HistoryAction, HistoryChange, Operation, OperationKind, RedoEntry, SlotState,
};
