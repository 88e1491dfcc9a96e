use serde::{Deserialize, Serialize};

use crate::models::{Rect, SlotId, SlotIndex, ValidationState};
use crate::registry::SlotRegistry;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Underline marker in slot-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Underline {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub thickness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decoration {
    pub slot: SlotId,
    pub index: SlotIndex,
    pub state: ValidationState,
    pub underline: Underline,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnderlineStyle {
    pub offset: f64,
    pub thickness: f64,
}

impl UnderlineStyle {
    pub fn place(&self, bounds: &Rect) -> Underline {
        Underline {
            x: bounds.x,
            y: bounds.max_y() + self.offset,
            width: bounds.width,
            thickness: self.thickness,
        }
    }
}

/// Slot and ink revision a compacted expression was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactedSource {
    pub slot: SlotId,
    pub revision: u64,
}

/// Recognized text of the non-empty slots, in slot order, plus the slot
/// index each compacted position came from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompactedLines {
    pub expressions: Vec<String>,
    pub index_map: Vec<SlotIndex>,
    pub sources: Vec<CompactedSource>,
}

impl CompactedLines {
    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }
}

pub fn compact_non_empty(registry: &SlotRegistry) -> CompactedLines {
    let mut compacted = CompactedLines::default();
    for (index, slot) in registry.slots().enumerate() {
        let Some(text) = slot.symbolic_text.as_deref() else {
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }
        compacted.expressions.push(text.to_string());
        compacted.index_map.push(index);
        compacted.sources.push(CompactedSource {
            slot: slot.id,
            revision: slot.revision,
        });
    }
    compacted
}

/// A verdict that still applies to its slot, with the slot's current index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveResult {
    pub slot: SlotId,
    pub index: SlotIndex,
    pub result: Option<bool>,
}

/// Pairs each result with the slot its expression was read from. Results for
/// slots that were removed or whose ink changed since compaction are dropped.
pub fn live_results(
    results: &[Option<bool>],
    compacted: &CompactedLines,
    registry: &SlotRegistry,
) -> Vec<LiveResult> {
    if results.len() != compacted.sources.len() {
        log_warn!(
            "validation returned {} result(s) for {} expression(s); extra entries ignored",
            results.len(),
            compacted.sources.len()
        );
    }

    results
        .iter()
        .zip(compacted.sources.iter())
        .filter_map(|(result, source)| {
            let Some(slot) = registry.slot(source.slot) else {
                log_debug!("dropping verdict for removed {}", source.slot);
                return None;
            };
            if slot.revision != source.revision {
                log_debug!(
                    "dropping verdict for {} (computed from revision {}, now {})",
                    source.slot,
                    source.revision,
                    slot.revision
                );
                return None;
            }
            Some(LiveResult {
                slot: source.slot,
                index: registry.index_of(source.slot)?,
                result: *result,
            })
        })
        .collect()
}

/// Maps compacted tri-state results back onto slots. Position `i` targets
/// slot index `index_map[i]`. Slots without bounds produce no decoration.
pub fn map_to_slots(
    results: &[Option<bool>],
    index_map: &[SlotIndex],
    registry: &SlotRegistry,
    style: UnderlineStyle,
) -> Vec<Decoration> {
    if results.len() != index_map.len() {
        log_warn!(
            "validation returned {} result(s) for {} expression(s); extra entries ignored",
            results.len(),
            index_map.len()
        );
    }

    results
        .iter()
        .zip(index_map.iter())
        .filter_map(|(result, index)| {
            let slot = registry.id_at(*index).and_then(|id| registry.slot(id))?;
            let bounds = slot.bounds?;
            Some(Decoration {
                slot: slot.id,
                index: *index,
                state: ValidationState::from_tri_state(*result),
                underline: style.place(&bounds),
            })
        })
        .collect()
}

/// Rederives decorations from the validation state stored on each slot.
pub fn current_decorations(registry: &SlotRegistry, style: UnderlineStyle) -> Vec<Decoration> {
    registry
        .slots()
        .enumerate()
        .filter_map(|(index, slot)| {
            let state = slot.validation?;
            let bounds = slot.bounds?;
            Some(Decoration {
                slot: slot.id,
                index,
                state,
                underline: style.place(&bounds),
            })
        })
        .collect()
}
