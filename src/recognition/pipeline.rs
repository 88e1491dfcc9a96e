use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use tokio_util::sync::CancellationToken;

use crate::engine::state::EngineShared;
use crate::models::SlotId;

use super::types::{Recognition, Recognizer, SettleTrigger, StrokeBundle};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

struct PendingRecognition {
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct PendingSet {
    next_generation: u64,
    slots: HashMap<SlotId, PendingRecognition>,
}

/// Debounced, per-slot dispatch to the external recognizer.
///
/// A settle event for a slot cancels that slot's pending debounce and starts
/// a new one. Once the debounce elapses the slot's strokes are captured with
/// their revision; the result is applied only if the revision is unchanged
/// when the recognizer returns.
#[derive(Clone)]
pub struct RecognitionPipeline {
    recognizer: Arc<dyn Recognizer>,
    pending: Arc<Mutex<PendingSet>>,
    shutdown: CancellationToken,
    draw_delay: Duration,
    erase_delay: Duration,
    timeout: Duration,
}

impl RecognitionPipeline {
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        draw_delay: Duration,
        erase_delay: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            recognizer,
            pending: Arc::new(Mutex::new(PendingSet::default())),
            shutdown: CancellationToken::new(),
            draw_delay,
            erase_delay,
            timeout,
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, PendingSet> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn on_stroke_settled(
        &self,
        shared: &Arc<EngineShared>,
        slot: SlotId,
        trigger: SettleTrigger,
    ) {
        if self.shutdown.is_cancelled() {
            return;
        }

        let delay = match trigger {
            SettleTrigger::Draw => self.draw_delay,
            SettleTrigger::Erase => self.erase_delay,
        };

        let cancel = self.shutdown.child_token();
        let generation = {
            let mut pending = self.lock_pending();
            pending.next_generation += 1;
            let generation = pending.next_generation;
            let previous = pending.slots.insert(
                slot,
                PendingRecognition {
                    generation,
                    cancel: cancel.clone(),
                },
            );
            if let Some(previous) = previous {
                previous.cancel.cancel();
            }
            generation
        };

        tokio::spawn(recognize_after_debounce(
            self.clone(),
            Arc::clone(shared),
            slot,
            generation,
            delay,
            cancel,
        ));
    }

    /// Number of slots still waiting for their debounce to elapse.
    pub fn pending_len(&self) -> usize {
        self.lock_pending().slots.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Cancels every pending debounce; in-flight results are discarded.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.lock_pending().slots.clear();
    }

    fn release(&self, slot: SlotId, generation: u64) {
        let mut pending = self.lock_pending();
        let is_current = pending
            .slots
            .get(&slot)
            .map(|entry| entry.generation == generation)
            .unwrap_or(false);
        if is_current {
            pending.slots.remove(&slot);
        }
    }

    async fn dispatch(&self, bundle: StrokeBundle) -> Result<Recognition> {
        let recognizer = Arc::clone(&self.recognizer);
        let call = tokio::task::spawn_blocking(move || recognizer.recognize(&bundle));

        match tokio::time::timeout(self.timeout, call).await {
            Ok(joined) => joined.context("recognizer worker join failed")?,
            Err(_) => Err(anyhow!(
                "recognizer timed out after {}ms",
                self.timeout.as_millis()
            )),
        }
    }
}

async fn recognize_after_debounce(
    pipeline: RecognitionPipeline,
    shared: Arc<EngineShared>,
    slot: SlotId,
    generation: u64,
    delay: Duration,
    cancel: CancellationToken,
) {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            log_debug!("recognition for {} superseded during debounce", slot);
            return;
        }
        _ = tokio::time::sleep(delay) => {}
    }
    pipeline.release(slot, generation);

    let Some((revision, bundle)) = shared.begin_recognition(slot).await else {
        return;
    };

    log_debug!(
        "dispatching recognition for {} ({} stroke(s), revision {})",
        slot,
        bundle.strokes.len(),
        revision
    );
    let outcome = pipeline.dispatch(bundle).await;

    if pipeline.is_shut_down() {
        log_debug!("engine shut down; dropping recognition result for {}", slot);
        return;
    }
    if let Err(err) = &outcome {
        log_warn!("recognition call for {} failed: {err:#}", slot);
    }

    shared.finish_recognition(slot, revision, outcome).await;
}
