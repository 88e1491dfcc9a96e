use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::models::{GlobalStrokeRecord, PathData, SlotId, Stroke, StrokeId};
use crate::registry::SlotRegistry;

use super::operation::{
    HistoryAction, HistoryChange, Operation, OperationKind, RedoEntry, SlotState,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Linear undo/redo timeline shared by every slot of a session.
#[derive(Debug, Clone, Default)]
pub struct HistoryManager {
    records: Vec<GlobalStrokeRecord>,
    undo_stack: Vec<Operation>,
    redo_stack: Vec<RedoEntry>,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit_stroke_add(&mut self, slot: SlotId, stroke_id: StrokeId, timestamp: DateTime<Utc>) {
        self.records.push(GlobalStrokeRecord {
            stroke_id,
            owner: slot,
            timestamp,
        });
        self.push_committed(Operation::StrokeAdd { slot, stroke_id });
    }

    pub fn commit_erase(&mut self, slots: Vec<SlotId>, before: Vec<SlotState>) {
        self.push_committed(Operation::CrossCanvasErase { slots, before });
    }

    pub fn commit_clear(&mut self, before: Vec<SlotState>) {
        self.push_committed(Operation::ClearAll { before });
    }

    fn push_committed(&mut self, operation: Operation) {
        log_debug!(
            "history commit {:?} (undo depth {}, dropping {} redo entries)",
            operation.kind(),
            self.undo_stack.len() + 1,
            self.redo_stack.len()
        );
        self.undo_stack.push(operation);
        self.redo_stack.clear();
    }

    /// Snapshots every non-empty slot, wipes them all and commits a single
    /// `ClearAll`. Returns `None` when there was nothing to clear.
    pub fn clear_all(&mut self, registry: &mut SlotRegistry) -> Option<Vec<SlotId>> {
        let before: Vec<SlotState> = capture(registry, registry.ids())
            .into_iter()
            .filter(|state| !state.strokes.is_empty())
            .collect();
        if before.is_empty() {
            return None;
        }

        let cleared: Vec<SlotId> = before.iter().map(|state| state.slot).collect();
        for slot in &cleared {
            if let Some(surface) = registry.surface_mut(*slot) {
                surface.import_strokes(PathData::default());
            }
        }

        self.commit_clear(before);
        Some(cleared)
    }

    /// Reverts the most recent committed operation, whichever slot it touched.
    pub fn undo(&mut self, registry: &mut SlotRegistry) -> Option<HistoryChange> {
        let operation = self.undo_stack.pop()?;
        let kind = operation.kind();
        let slots = operation.slots();

        let (added, removed) = match operation {
            Operation::StrokeAdd { slot, stroke_id } => {
                let record = self.take_record(stroke_id);
                let stroke = registry
                    .surface_mut(slot)
                    .and_then(|surface| surface.remove_stroke(stroke_id));

                match stroke {
                    Some(stroke) => {
                        self.redo_stack.push(RedoEntry::Stroke {
                            slot,
                            stroke,
                            record,
                        });
                        (Vec::new(), vec![(slot, stroke_id)])
                    }
                    None => {
                        log_warn!("undo: {} is no longer on {}; nothing to remove", stroke_id, slot);
                        (Vec::new(), Vec::new())
                    }
                }
            }
            operation => {
                let before = match &operation {
                    Operation::CrossCanvasErase { before, .. } | Operation::ClearAll { before } => {
                        before.clone()
                    }
                    Operation::StrokeAdd { .. } => Vec::new(),
                };
                let after = capture(registry, &slots);
                restore(registry, &before);
                let diff = diff_states(&after, &before);
                self.redo_stack.push(RedoEntry::Restore { operation, after });
                diff
            }
        };

        Some(HistoryChange {
            action: HistoryAction::Undo,
            kind,
            slots,
            added,
            removed,
        })
    }

    /// Re-applies the inverse recorded by the last undo. Stroke entries whose
    /// surface is gone are dropped and the next entry is tried.
    pub fn redo(&mut self, registry: &mut SlotRegistry) -> Option<HistoryChange> {
        loop {
            let entry = self.redo_stack.pop()?;

            let change = match entry {
                RedoEntry::Stroke {
                    slot,
                    stroke,
                    record,
                } => {
                    let stroke_id = stroke.id;
                    let Some(surface) = registry.surface_mut(slot) else {
                        log_warn!("redo: surface for {} is gone; dropping {}", slot, stroke_id);
                        continue;
                    };
                    surface.add_stroke(stroke.clone());

                    self.records.push(record.unwrap_or_else(|| GlobalStrokeRecord {
                        stroke_id,
                        owner: slot,
                        timestamp: Utc::now(),
                    }));
                    self.undo_stack.push(Operation::StrokeAdd { slot, stroke_id });

                    HistoryChange {
                        action: HistoryAction::Redo,
                        kind: OperationKind::StrokeAdd,
                        slots: vec![slot],
                        added: vec![stroke],
                        removed: Vec::new(),
                    }
                }
                RedoEntry::Restore { operation, after } => {
                    let slots = operation.slots();
                    let current = capture(registry, &slots);
                    restore(registry, &after);
                    let (added, removed) = diff_states(&current, &after);
                    let kind = operation.kind();
                    self.undo_stack.push(operation);

                    HistoryChange {
                        action: HistoryAction::Redo,
                        kind,
                        slots,
                        added,
                        removed,
                    }
                }
            };

            return Some(change);
        }
    }

    fn take_record(&mut self, stroke_id: StrokeId) -> Option<GlobalStrokeRecord> {
        let position = self
            .records
            .iter()
            .rposition(|record| record.stroke_id == stroke_id)?;
        Some(self.records.remove(position))
    }

    pub fn records(&self) -> &[GlobalStrokeRecord] {
        &self.records
    }

    pub fn last_stroke_timestamp(&self) -> Option<DateTime<Utc>> {
        self.records.last().map(|record| record.timestamp)
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn last_operation(&self) -> Option<&Operation> {
        self.undo_stack.last()
    }
}

/// Captures the stroke state of every listed slot that still has a surface.
pub fn capture(registry: &SlotRegistry, slots: &[SlotId]) -> Vec<SlotState> {
    slots
        .iter()
        .filter_map(|slot| {
            registry.surface(*slot).map(|surface| SlotState {
                slot: *slot,
                strokes: surface.export_strokes(),
            })
        })
        .collect()
}

fn restore(registry: &mut SlotRegistry, states: &[SlotState]) {
    for state in states {
        match registry.surface_mut(state.slot) {
            Some(surface) => surface.import_strokes(state.strokes.clone()),
            None => log_warn!("restore: surface for {} is gone; skipping", state.slot),
        }
    }
}

/// Strokes present in `to` but not `from` (added) and the reverse (removed).
fn diff_states(from: &[SlotState], to: &[SlotState]) -> (Vec<Stroke>, Vec<(SlotId, StrokeId)>) {
    let mut added = Vec::new();
    let mut removed = Vec::new();

    for target in to {
        let previous: HashSet<StrokeId> = from
            .iter()
            .find(|state| state.slot == target.slot)
            .map(|state| state.strokes.stroke_ids().into_iter().collect())
            .unwrap_or_default();
        let next: HashSet<StrokeId> = target.strokes.stroke_ids().into_iter().collect();

        added.extend(
            target
                .strokes
                .strokes
                .iter()
                .filter(|stroke| !previous.contains(&stroke.id))
                .cloned(),
        );
        removed.extend(
            previous
                .iter()
                .filter(|id| !next.contains(id))
                .map(|id| (target.slot, *id)),
        );
    }

    removed.sort();
    (added, removed)
}
