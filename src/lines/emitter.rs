use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;

use crate::models::{FocusTransition, LineSnapshot, SlotId, SlotIndex};
use crate::registry::SlotRegistry;

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Payload pushed to the host after every committed change.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinesDataChangedEvent {
    pub session_id: String,
    pub current: Vec<LineSnapshot>,
    pub history: Vec<FocusTransition>,
}

/// Keeps the host-visible `{current, history}` view of every line.
#[derive(Debug, Clone, Default)]
pub struct LineStateEmitter {
    current: Vec<LineSnapshot>,
    history: Vec<FocusTransition>,
    /// Snapshot of each slot as it stood when focus last left it.
    baselines: HashMap<SlotId, LineSnapshot>,
}

impl LineStateEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh(&mut self, registry: &SlotRegistry) {
        self.current = registry.line_snapshots();
    }

    pub fn current(&self) -> &[LineSnapshot] {
        &self.current
    }

    pub fn history(&self) -> &[FocusTransition] {
        &self.history
    }

    /// Records a transition when focus leaves a line with content for a
    /// different line. The live snapshot of `from` becomes its new baseline.
    pub fn notify_focus_changed(
        &mut self,
        registry: &SlotRegistry,
        from: Option<SlotIndex>,
        to: SlotIndex,
    ) -> Option<FocusTransition> {
        let from_index = from?;
        if from_index == to {
            return None;
        }

        let slot = registry.id_at(from_index)?;
        let live = registry.line_snapshot(slot)?;
        if !live.has_content() {
            log_debug!("focus left empty line {}; no transition recorded", from_index);
            return None;
        }

        let before = self.baselines.get(&slot).cloned().unwrap_or_default();
        let transition = FocusTransition {
            from: Some(from_index),
            to,
            snapshot_before: before,
            snapshot_after: live.clone(),
            timestamp: Utc::now(),
        };

        self.baselines.insert(slot, live);
        self.history.push(transition.clone());
        Some(transition)
    }

    pub fn forget_slot(&mut self, slot: SlotId) {
        self.baselines.remove(&slot);
    }

    pub fn event(&self, session_id: &str) -> LinesDataChangedEvent {
        LinesDataChangedEvent {
            session_id: session_id.to_string(),
            current: self.current.clone(),
            history: self.history.clone(),
        }
    }
}
