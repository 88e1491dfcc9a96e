pub mod config;
pub mod controller;
pub mod host;
pub(crate) mod state;

pub use config::EngineConfig;
pub use controller::InkEngine;
pub use host::{InkHost, NoopHost};
pub use state::RecognitionApplied;
