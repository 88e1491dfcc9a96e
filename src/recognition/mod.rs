pub mod pipeline;
pub mod types;

pub use pipeline::RecognitionPipeline;
pub use types::{Recognition, RecognitionResult, Recognizer, SettleTrigger, StrokeBundle};
