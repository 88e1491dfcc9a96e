use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;

use crate::history::HistoryManager;
use crate::lines::LineStateEmitter;
use crate::models::{SlotId, StrokeId};
use crate::recognition::{Recognition, RecognitionResult, StrokeBundle};
use crate::registry::{MutationEffect, SlotRegistry};
use crate::transform::RectCache;
use crate::validation::{current_decorations, Decoration, UnderlineStyle};

use super::config::EngineConfig;
use super::host::InkHost;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Where host notifications go and how decorations are placed.
pub(crate) struct Notifier<'a> {
    pub(crate) host: &'a dyn InkHost,
    pub(crate) session_id: &'a str,
    pub(crate) style: UnderlineStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionApplied {
    Applied,
    Failed,
    Stale,
    UnknownSlot,
}

/// Everything one question session mutates. Guarded by a single lock so
/// every command is applied serially and completely.
pub(crate) struct EngineState {
    pub(crate) registry: SlotRegistry,
    pub(crate) rects: RectCache,
    pub(crate) history: HistoryManager,
    pub(crate) lines: LineStateEmitter,
    pub(crate) decorations: Vec<Decoration>,
    next_stroke_id: u64,
}

impl EngineState {
    pub(crate) fn new() -> Self {
        Self {
            registry: SlotRegistry::new(),
            rects: RectCache::new(),
            history: HistoryManager::new(),
            lines: LineStateEmitter::new(),
            decorations: Vec::new(),
            next_stroke_id: 1,
        }
    }

    pub(crate) fn issue_stroke_id(&mut self) -> StrokeId {
        let id = StrokeId(self.next_stroke_id);
        self.next_stroke_id += 1;
        id
    }

    /// Refreshes derived state of every touched slot, then publishes.
    pub(crate) fn after_mutation(
        &mut self,
        slots: &[SlotId],
        notifier: &Notifier<'_>,
    ) -> Vec<MutationEffect> {
        let mut effects = Vec::with_capacity(slots.len());
        for slot in slots {
            if effects.iter().any(|effect: &MutationEffect| effect.slot == *slot) {
                continue;
            }
            if let Some(effect) = self.registry.mark_mutated(*slot) {
                effects.push(effect);
            }
        }

        for effect in &effects {
            if effect.expression_cleared {
                notifier.host.on_expression_updated(effect.index, "");
            }
        }

        self.refresh_decorations(notifier);
        self.publish(notifier);
        effects
    }

    pub(crate) fn refresh_decorations(&mut self, notifier: &Notifier<'_>) {
        let next = current_decorations(&self.registry, notifier.style);
        if next != self.decorations {
            self.decorations = next;
            notifier.host.on_decorations_changed(&self.decorations);
        }
    }

    pub(crate) fn publish(&mut self, notifier: &Notifier<'_>) {
        self.lines.refresh(&self.registry);
        notifier
            .host
            .on_lines_data_change(&self.lines.event(notifier.session_id));
    }

    /// Captures what the recognizer should see for `slot`. An empty slot is
    /// cleared on the spot and yields `None`.
    pub(crate) fn recognition_request(
        &mut self,
        slot: SlotId,
        notifier: &Notifier<'_>,
    ) -> Option<(u64, StrokeBundle)> {
        let index = self.registry.index_of(slot)?;
        let strokes = self.registry.strokes(slot);
        let record = self.registry.slot_mut(slot)?;

        if strokes.is_empty() {
            let had_text = record.symbolic_text.is_some();
            let had_result = had_text || record.confidence.is_some();
            record.clear_recognition();
            if had_text {
                notifier.host.on_expression_updated(index, "");
            }
            if had_result {
                self.publish(notifier);
            }
            return None;
        }

        Some((
            record.revision,
            StrokeBundle {
                slot,
                index,
                strokes,
            },
        ))
    }

    /// Applies a recognizer outcome computed from `revision`. Results for a
    /// slot that changed since dispatch are discarded.
    pub(crate) fn apply_recognition(
        &mut self,
        slot: SlotId,
        revision: u64,
        outcome: Result<Recognition>,
        notifier: &Notifier<'_>,
    ) -> RecognitionApplied {
        let Some(index) = self.registry.index_of(slot) else {
            return RecognitionApplied::UnknownSlot;
        };
        let Some(record) = self.registry.slot_mut(slot) else {
            return RecognitionApplied::UnknownSlot;
        };

        if record.revision != revision {
            log_debug!(
                "discarding stale recognition for {} (computed from revision {}, now {})",
                slot,
                revision,
                record.revision
            );
            return RecognitionApplied::Stale;
        }

        match outcome {
            Ok(recognition) => {
                let result = RecognitionResult::new(slot, recognition);
                let changed = record.symbolic_text.as_deref() != Some(result.symbolic.as_str());

                record.symbolic_text = Some(result.symbolic.clone());
                record.confidence = Some(result.confidence);
                record.raw = Some(result.raw);

                if changed {
                    notifier.host.on_expression_updated(index, &result.symbolic);
                }
                self.publish(notifier);
                RecognitionApplied::Applied
            }
            Err(err) => {
                log_warn!("clearing recognition for {} after failure: {err:#}", slot);
                record.clear_recognition();
                notifier.host.on_expression_updated(index, "");
                // Keep the snapshot accurate without notifying the host again.
                self.lines.refresh(&self.registry);
                RecognitionApplied::Failed
            }
        }
    }
}

/// State plus the fixed collaborators every engine clone shares.
pub(crate) struct EngineShared {
    pub(crate) state: Mutex<EngineState>,
    pub(crate) host: Arc<dyn InkHost>,
    pub(crate) config: EngineConfig,
    pub(crate) session_id: String,
}

impl EngineShared {
    pub(crate) fn notifier(&self) -> Notifier<'_> {
        Notifier {
            host: self.host.as_ref(),
            session_id: &self.session_id,
            style: self.config.underline_style(),
        }
    }

    pub(crate) async fn begin_recognition(&self, slot: SlotId) -> Option<(u64, StrokeBundle)> {
        let mut state = self.state.lock().await;
        state.recognition_request(slot, &self.notifier())
    }

    pub(crate) async fn finish_recognition(
        &self,
        slot: SlotId,
        revision: u64,
        outcome: Result<Recognition>,
    ) -> RecognitionApplied {
        let mut state = self.state.lock().await;
        state.apply_recognition(slot, revision, outcome, &self.notifier())
    }
}
