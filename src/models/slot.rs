use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::stroke::{PathData, SlotId};

/// Position of a slot in line order, as seen by the host.
pub type SlotIndex = usize;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ValidationState {
    Valid,
    Invalid,
    Indeterminate,
}

impl ValidationState {
    pub fn from_tri_state(value: Option<bool>) -> Self {
        match value {
            Some(true) => ValidationState::Valid,
            Some(false) => ValidationState::Invalid,
            None => ValidationState::Indeterminate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: SlotId,
    pub symbolic_text: Option<String>,
    pub confidence: Option<f64>,
    /// Recognizer output kept verbatim for the host.
    pub raw: Option<serde_json::Value>,
    pub bounds: Option<Rect>,
    pub validation: Option<ValidationState>,
    /// Bumped on every stroke mutation; recognition results carry the
    /// revision they were computed from.
    #[serde(skip)]
    pub revision: u64,
}

impl Slot {
    pub fn new(id: SlotId) -> Self {
        Self {
            id,
            symbolic_text: None,
            confidence: None,
            raw: None,
            bounds: None,
            validation: None,
            revision: 0,
        }
    }

    pub fn clear_recognition(&mut self) {
        self.symbolic_text = None;
        self.confidence = None;
        self.raw = None;
    }
}

/// Externally visible state of one line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LineSnapshot {
    pub symbolic_text: Option<String>,
    pub confidence: Option<f64>,
    pub strokes: PathData,
    pub validation: Option<ValidationState>,
}

impl LineSnapshot {
    pub fn has_content(&self) -> bool {
        !self.strokes.is_empty()
            || self
                .symbolic_text
                .as_deref()
                .map(|text| !text.trim().is_empty())
                .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FocusTransition {
    pub from: Option<SlotIndex>,
    pub to: SlotIndex,
    pub snapshot_before: LineSnapshot,
    pub snapshot_after: LineSnapshot,
    pub timestamp: DateTime<Utc>,
}
