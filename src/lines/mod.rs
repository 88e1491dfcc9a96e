pub mod emitter;

pub use emitter::{LineStateEmitter, LinesDataChangedEvent};
