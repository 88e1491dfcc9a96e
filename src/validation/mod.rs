pub mod decorations;

pub use decorations::{
    compact_non_empty, current_decorations, live_results, map_to_slots, CompactedLines,
    CompactedSource, Decoration, LiveResult, Underline, UnderlineStyle,
};

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Verdict for the whole answer, when the backend gives one.
    pub valid: Option<bool>,
    /// One tri-state entry per submitted expression, in submission order.
    pub per_expression: Vec<Option<bool>>,
}

/// External validation backend. Called off the async runtime, so blocking
/// implementations are fine.
pub trait Validator: Send + Sync {
    fn validate(&self, expressions: &[String]) -> Result<ValidationReport>;
}
