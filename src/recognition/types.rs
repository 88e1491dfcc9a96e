use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::models::{PathData, SlotId, SlotIndex};

/// Strokes of one slot as handed to the recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeBundle {
    pub slot: SlotId,
    pub index: SlotIndex,
    pub strokes: PathData,
}

/// Recognizer output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    pub symbolic: String,
    pub confidence: f64,
    #[serde(default)]
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub slot: SlotId,
    pub symbolic: String,
    pub confidence: f64,
    pub raw: serde_json::Value,
}

impl RecognitionResult {
    pub fn new(slot: SlotId, recognition: Recognition) -> Self {
        Self {
            slot,
            symbolic: recognition.symbolic,
            confidence: recognition.confidence,
            raw: recognition.raw,
        }
    }
}

/// What caused a slot to need recognition; picks the debounce delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleTrigger {
    Draw,
    Erase,
}

/// External handwriting recognizer. Runs on a blocking worker thread, so
/// implementations may block on network or model inference.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, bundle: &StrokeBundle) -> Result<Recognition>;
}
