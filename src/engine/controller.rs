use std::{collections::BTreeSet, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::erase::{EraseCoordinator, EraseOutcome};
use crate::history::HistoryChange;
use crate::layout;
use crate::lines::LinesDataChangedEvent;
use crate::models::{
    FocusTransition, PathData, Point, Rect, Slot, SlotId, SlotIndex, Stroke, StrokeId, StrokeStyle,
    ValidationState,
};
use crate::recognition::{RecognitionPipeline, Recognizer, SettleTrigger};
use crate::surface::DrawableSurface;
use crate::validation::{
    compact_non_empty, live_results, map_to_slots, CompactedLines, Decoration, ValidationReport,
    Validator,
};

use super::config::EngineConfig;
use super::host::InkHost;
use super::state::{EngineShared, EngineState};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// One question session's ink engine. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct InkEngine {
    shared: Arc<EngineShared>,
    pipeline: RecognitionPipeline,
    eraser: EraseCoordinator,
}

impl InkEngine {
    pub fn new(config: EngineConfig, recognizer: Arc<dyn Recognizer>, host: Arc<dyn InkHost>) -> Self {
        let session_id = Uuid::new_v4().to_string();
        let pipeline = RecognitionPipeline::new(
            recognizer,
            config.draw_debounce(),
            config.erase_debounce(),
            config.recognition_timeout(),
        );
        let eraser = EraseCoordinator::new(config.erase_tolerance, config.eraser_radius);

        info!("ink engine {} created", session_id);

        Self {
            shared: Arc::new(EngineShared {
                state: Mutex::new(EngineState::new()),
                host,
                config,
                session_id,
            }),
            pipeline,
            eraser,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.shared.session_id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Cancels pending recognition. Results still in flight are dropped.
    pub fn shutdown(&self) {
        self.pipeline.shutdown();
        info!("ink engine {} shut down", self.shared.session_id);
    }

    pub fn pending_recognitions(&self) -> usize {
        self.pipeline.pending_len()
    }

    /// Declares a new line at the end of the slot order.
    pub async fn add_slot(&self, surface: Box<dyn DrawableSurface>) -> SlotId {
        let mut state = self.shared.state.lock().await;
        let slot = state.registry.insert(surface);
        state.registry.mark_mutated(slot);
        state.publish(&self.shared.notifier());
        log_debug!("added {} at index {}", slot, state.registry.len() - 1);
        slot
    }

    pub async fn remove_slot(&self, slot: SlotId) -> Result<Slot> {
        let mut state = self.shared.state.lock().await;
        let removed = state
            .registry
            .remove(slot)
            .ok_or_else(|| anyhow!("unknown slot {slot}"))?;
        state.rects.remove(slot);
        state.lines.forget_slot(slot);

        let notifier = self.shared.notifier();
        state.refresh_decorations(&notifier);
        state.publish(&notifier);
        Ok(removed)
    }

    /// Swaps in a new surface for `slot`, returning the previous one.
    pub async fn attach_surface(
        &self,
        slot: SlotId,
        surface: Box<dyn DrawableSurface>,
    ) -> Result<Option<Box<dyn DrawableSurface>>> {
        let previous = {
            let mut state = self.shared.state.lock().await;
            let previous = state.registry.attach_surface(slot, surface)?;
            state.after_mutation(&[slot], &self.shared.notifier());
            previous
        };
        self.pipeline
            .on_stroke_settled(&self.shared, slot, SettleTrigger::Erase);
        Ok(previous)
    }

    /// Unmounts the surface of `slot`. The slot keeps its record; erase
    /// fan-out skips it until a surface is attached again.
    pub async fn detach_surface(&self, slot: SlotId) -> Result<Option<Box<dyn DrawableSurface>>> {
        let mut state = self.shared.state.lock().await;
        if !state.registry.contains(slot) {
            bail!("unknown slot {slot}");
        }
        Ok(state.registry.detach_surface(slot))
    }

    pub async fn set_slot_rect(&self, slot: SlotId, rect: Rect) -> Result<()> {
        let mut state = self.shared.state.lock().await;
        if !state.registry.contains(slot) {
            bail!("unknown slot {slot}");
        }
        state.rects.set(slot, rect);
        Ok(())
    }

    pub async fn slot(&self, slot: SlotId) -> Option<Slot> {
        self.shared.state.lock().await.registry.slot(slot).cloned()
    }

    /// Slots in line order.
    pub async fn slots(&self) -> Vec<Slot> {
        self.shared
            .state
            .lock()
            .await
            .registry
            .slots()
            .cloned()
            .collect()
    }

    pub async fn slot_id_at(&self, index: SlotIndex) -> Option<SlotId> {
        self.shared.state.lock().await.registry.id_at(index)
    }

    pub async fn strokes(&self, slot: SlotId) -> PathData {
        self.shared.state.lock().await.registry.strokes(slot)
    }

    pub async fn set_erase_mode(&self, enabled: bool) {
        let mut state = self.shared.state.lock().await;
        let ids = state.registry.ids().to_vec();
        for slot in ids {
            if let Some(surface) = state.registry.surface_mut(slot) {
                surface.set_erase_mode(enabled);
            }
        }
    }

    /// Commits a finished pen gesture on `slot`. Gestures without points
    /// are ignored and return `Ok(None)`.
    pub async fn commit_stroke(
        &self,
        slot: SlotId,
        points: Vec<Point>,
        style: StrokeStyle,
    ) -> Result<Option<StrokeId>> {
        let stroke_id = {
            let mut state = self.shared.state.lock().await;
            let index = state
                .registry
                .index_of(slot)
                .ok_or_else(|| anyhow!("unknown slot {slot}"))?;
            if points.is_empty() {
                log_debug!("ignoring empty gesture on {}", slot);
                return Ok(None);
            }
            if !state.registry.has_surface(slot) {
                bail!("{slot} has no surface attached");
            }

            let stroke_id = state.issue_stroke_id();
            let stroke = Stroke {
                id: stroke_id,
                owner: slot,
                points,
                style,
            };
            let surface = state
                .registry
                .surface_mut(slot)
                .context("surface vanished while committing stroke")?;
            surface.add_stroke(stroke.clone());
            state.history.commit_stroke_add(slot, stroke_id, Utc::now());

            let notifier = self.shared.notifier();
            notifier.host.on_stroke_added(index, &stroke);
            state.after_mutation(&[slot], &notifier);
            stroke_id
        };

        self.pipeline
            .on_stroke_settled(&self.shared, slot, SettleTrigger::Draw);
        Ok(Some(stroke_id))
    }

    /// Slots an eraser path (in `origin`-local coordinates) would reach.
    pub async fn intersected_slots(&self, origin: SlotId, path: &[Point]) -> Result<BTreeSet<SlotId>> {
        let state = self.shared.state.lock().await;
        if !state.registry.contains(origin) {
            bail!("unknown slot {origin}");
        }
        Ok(self
            .eraser
            .intersected_slots(&state.registry, &state.rects, path, origin))
    }

    /// Runs an erase gesture across every slot it reaches and records it as a
    /// single undoable operation.
    pub async fn erase(&self, origin: SlotId, path: &[Point]) -> Result<Option<EraseOutcome>> {
        let outcome = {
            let mut state = self.shared.state.lock().await;
            if !state.registry.contains(origin) {
                bail!("unknown slot {origin}");
            }

            let EngineState {
                registry,
                rects,
                history,
                ..
            } = &mut *state;
            let Some(outcome) = self
                .eraser
                .perform_erase(registry, rects, history, path, origin)
            else {
                return Ok(None);
            };

            let notifier = self.shared.notifier();
            for (slot, erased) in &outcome.erased {
                let Some(index) = state.registry.index_of(*slot) else {
                    continue;
                };
                notifier
                    .host
                    .on_erase_action(index, &PathData::new(erased.clone()));
                for stroke in erased {
                    notifier.host.on_stroke_removed(index, stroke.id);
                }
            }
            state.after_mutation(&outcome.slots, &notifier);
            outcome
        };

        for slot in &outcome.slots {
            self.pipeline
                .on_stroke_settled(&self.shared, *slot, SettleTrigger::Erase);
        }
        Ok(Some(outcome))
    }

    pub async fn trigger_undo(&self) -> Option<HistoryChange> {
        let change = {
            let mut state = self.shared.state.lock().await;
            let EngineState {
                registry, history, ..
            } = &mut *state;
            let change = history.undo(registry)?;
            self.publish_history_change(&mut state, &change);
            change
        };
        self.resettle(&change.slots);
        Some(change)
    }

    pub async fn trigger_redo(&self) -> Option<HistoryChange> {
        let change = {
            let mut state = self.shared.state.lock().await;
            let EngineState {
                registry, history, ..
            } = &mut *state;
            let change = history.redo(registry)?;
            self.publish_history_change(&mut state, &change);
            change
        };
        self.resettle(&change.slots);
        Some(change)
    }

    /// Wipes every slot as one undoable step. `None` when nothing had ink.
    pub async fn trigger_clear_all(&self) -> Option<Vec<SlotId>> {
        let cleared = {
            let mut state = self.shared.state.lock().await;
            let EngineState {
                registry, history, ..
            } = &mut *state;
            let cleared = history.clear_all(registry)?;
            state.after_mutation(&cleared, &self.shared.notifier());
            cleared
        };
        info!("cleared {} line(s)", cleared.len());
        self.resettle(&cleared);
        Some(cleared)
    }

    pub async fn last_stroke_timestamp(&self) -> Option<DateTime<Utc>> {
        self.shared.state.lock().await.history.last_stroke_timestamp()
    }

    pub async fn can_undo(&self) -> bool {
        self.shared.state.lock().await.history.can_undo()
    }

    pub async fn can_redo(&self) -> bool {
        self.shared.state.lock().await.history.can_redo()
    }

    fn publish_history_change(&self, state: &mut EngineState, change: &HistoryChange) {
        let notifier = self.shared.notifier();
        for stroke in &change.added {
            if let Some(index) = state.registry.index_of(stroke.owner) {
                notifier.host.on_stroke_added(index, stroke);
            }
        }
        for (slot, stroke_id) in &change.removed {
            if let Some(index) = state.registry.index_of(*slot) {
                notifier.host.on_stroke_removed(index, *stroke_id);
            }
        }
        state.after_mutation(&change.slots, &notifier);
    }

    fn resettle(&self, slots: &[SlotId]) {
        for slot in slots {
            self.pipeline
                .on_stroke_settled(&self.shared, *slot, SettleTrigger::Erase);
        }
    }

    pub async fn notify_focus_changed(
        &self,
        from: Option<SlotIndex>,
        to: SlotIndex,
    ) -> Option<FocusTransition> {
        let mut state = self.shared.state.lock().await;
        let EngineState {
            registry, lines, ..
        } = &mut *state;
        let transition = lines.notify_focus_changed(registry, from, to)?;
        state.publish(&self.shared.notifier());
        Some(transition)
    }

    pub async fn lines_data(&self) -> LinesDataChangedEvent {
        let mut state = self.shared.state.lock().await;
        let EngineState {
            registry, lines, ..
        } = &mut *state;
        lines.refresh(registry);
        lines.event(&self.shared.session_id)
    }

    /// Recognized text of the non-empty lines plus their slot indices.
    pub async fn compact_non_empty(&self) -> CompactedLines {
        compact_non_empty(&self.shared.state.lock().await.registry)
    }

    /// Stores a validation report computed for `compacted` and returns the
    /// decorations that could be placed. Verdicts for lines that were edited
    /// or removed after compaction are dropped.
    pub async fn apply_validation(
        &self,
        report: &ValidationReport,
        compacted: &CompactedLines,
    ) -> Vec<Decoration> {
        let mut state = self.shared.state.lock().await;
        let notifier = self.shared.notifier();

        let ids = state.registry.ids().to_vec();
        for slot in ids {
            if let Some(record) = state.registry.slot_mut(slot) {
                record.validation = None;
            }
        }

        let live = live_results(&report.per_expression, compacted, &state.registry);
        for entry in &live {
            if let Some(record) = state.registry.slot_mut(entry.slot) {
                record.validation = Some(ValidationState::from_tri_state(entry.result));
            }
        }
        let (results, indices): (Vec<Option<bool>>, Vec<SlotIndex>) =
            live.iter().map(|entry| (entry.result, entry.index)).unzip();
        let mapped = map_to_slots(&results, &indices, &state.registry, notifier.style);

        state.refresh_decorations(&notifier);
        state.publish(&notifier);
        mapped
    }

    /// Sends the current non-empty lines to `validator` and applies the
    /// report. `Ok(None)` when no line has recognized text.
    pub async fn validate_with(&self, validator: Arc<dyn Validator>) -> Result<Option<ValidationReport>> {
        let compacted = self.compact_non_empty().await;
        if compacted.is_empty() {
            return Ok(None);
        }

        let expressions = compacted.expressions.clone();
        let call = tokio::task::spawn_blocking(move || validator.validate(&expressions));
        let timeout = self.shared.config.validation_timeout();
        let report = match tokio::time::timeout(timeout, call).await {
            Ok(joined) => joined.context("validator worker join failed")??,
            Err(_) => {
                log_warn!("validation timed out after {}ms", timeout.as_millis());
                bail!("validation timed out after {}ms", timeout.as_millis());
            }
        };

        self.apply_validation(&report, &compacted).await;
        Ok(Some(report))
    }

    pub async fn decorations(&self) -> Vec<Decoration> {
        self.shared.state.lock().await.decorations.clone()
    }

    /// Adaptive height for every line, in line order.
    pub async fn slot_heights(&self) -> Vec<f64> {
        let state = self.shared.state.lock().await;
        let bounds: Vec<Option<Rect>> = state.registry.slots().map(|slot| slot.bounds).collect();
        layout::slot_heights(&self.shared.config, &bounds)
    }
}
