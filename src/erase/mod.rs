pub mod coordinator;

pub use coordinator::{EraseCoordinator, EraseOutcome};
