#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use anyhow::{bail, Result};
use mathink::{
    Decoration, DrawableSurface, EngineConfig, InkEngine, InkHost, LinesDataChangedEvent,
    MemorySurface, PathData, Point, Recognition, Recognizer, Rect, SlotId, SlotIndex, Stroke,
    StrokeBundle, StrokeId, StrokeStyle, ValidationReport, Validator,
};

/// Host that keeps every callback it receives.
#[derive(Default)]
pub struct RecordingHost {
    pub lines_events: Mutex<Vec<LinesDataChangedEvent>>,
    pub expressions: Mutex<Vec<(SlotIndex, String)>>,
    pub added: Mutex<Vec<(SlotIndex, StrokeId)>>,
    pub removed: Mutex<Vec<(SlotIndex, StrokeId)>>,
    pub erased: Mutex<Vec<(SlotIndex, usize)>>,
    pub decorations: Mutex<Vec<Vec<Decoration>>>,
}

impl RecordingHost {
    pub fn expressions(&self) -> Vec<(SlotIndex, String)> {
        self.expressions.lock().unwrap().clone()
    }

    pub fn last_lines_event(&self) -> Option<LinesDataChangedEvent> {
        self.lines_events.lock().unwrap().last().cloned()
    }

    pub fn erased(&self) -> Vec<(SlotIndex, usize)> {
        self.erased.lock().unwrap().clone()
    }

    pub fn last_decorations(&self) -> Option<Vec<Decoration>> {
        self.decorations.lock().unwrap().last().cloned()
    }
}

impl InkHost for RecordingHost {
    fn on_lines_data_change(&self, event: &LinesDataChangedEvent) {
        self.lines_events.lock().unwrap().push(event.clone());
    }

    fn on_expression_updated(&self, index: SlotIndex, symbolic: &str) {
        self.expressions
            .lock()
            .unwrap()
            .push((index, symbolic.to_string()));
    }

    fn on_stroke_added(&self, index: SlotIndex, stroke: &Stroke) {
        self.added.lock().unwrap().push((index, stroke.id));
    }

    fn on_stroke_removed(&self, index: SlotIndex, stroke_id: StrokeId) {
        self.removed.lock().unwrap().push((index, stroke_id));
    }

    fn on_erase_action(&self, index: SlotIndex, erased: &PathData) {
        self.erased.lock().unwrap().push((index, erased.len()));
    }

    fn on_decorations_changed(&self, decorations: &[Decoration]) {
        self.decorations.lock().unwrap().push(decorations.to_vec());
    }
}

/// Recognizer that answers `s<N>` where N is the stroke count, and remembers
/// every bundle it was given.
#[derive(Default)]
pub struct CountingRecognizer {
    pub calls: Mutex<Vec<StrokeBundle>>,
    pub fail_index: Mutex<Option<SlotIndex>>,
}

impl CountingRecognizer {
    pub fn calls(&self) -> Vec<StrokeBundle> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn fail_on(&self, index: Option<SlotIndex>) {
        *self.fail_index.lock().unwrap() = index;
    }
}

impl Recognizer for CountingRecognizer {
    fn recognize(&self, bundle: &StrokeBundle) -> Result<Recognition> {
        self.calls.lock().unwrap().push(bundle.clone());
        if *self.fail_index.lock().unwrap() == Some(bundle.index) {
            bail!("recognizer unavailable");
        }
        Ok(Recognition {
            symbolic: format!("s{}", bundle.strokes.len()),
            confidence: 0.9,
            raw: serde_json::json!({ "strokes": bundle.strokes.len() }),
        })
    }
}

/// Recognizer whose first call blocks until `release` is called.
#[derive(Default)]
pub struct GatedRecognizer {
    pub calls: AtomicUsize,
    pub entered: AtomicBool,
    released: AtomicBool,
}

impl GatedRecognizer {
    pub fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

impl Recognizer for GatedRecognizer {
    fn recognize(&self, bundle: &StrokeBundle) -> Result<Recognition> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            self.entered.store(true, Ordering::SeqCst);
            while !self.released.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(5));
            }
        }
        Ok(Recognition {
            symbolic: format!("call{}:{}", call, bundle.strokes.len()),
            confidence: 0.5,
            raw: serde_json::Value::Null,
        })
    }
}

/// In-memory surface that exposes its erase-mode flag to the test.
pub struct FlaggedSurface {
    inner: MemorySurface,
    pub erase_mode: Arc<AtomicBool>,
}

impl FlaggedSurface {
    pub fn boxed() -> (Box<dyn DrawableSurface>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        let surface = Self {
            inner: MemorySurface::new(),
            erase_mode: flag.clone(),
        };
        (Box::new(surface), flag)
    }
}

impl DrawableSurface for FlaggedSurface {
    fn add_stroke(&mut self, stroke: Stroke) -> StrokeId {
        self.inner.add_stroke(stroke)
    }

    fn remove_stroke(&mut self, id: StrokeId) -> Option<Stroke> {
        self.inner.remove_stroke(id)
    }

    fn export_strokes(&self) -> PathData {
        self.inner.export_strokes()
    }

    fn import_strokes(&mut self, data: PathData) {
        self.inner.import_strokes(data)
    }

    fn bounds(&self) -> Option<Rect> {
        self.inner.bounds()
    }

    fn set_erase_mode(&mut self, enabled: bool) {
        self.erase_mode.store(enabled, Ordering::SeqCst);
        self.inner.set_erase_mode(enabled);
    }

    fn erase_path(&mut self, path: &[Point], radius: f64) -> Vec<Stroke> {
        self.inner.erase_path(path, radius)
    }
}

/// Validator that answers with fixed verdicts after `delay`.
pub struct DelayedValidator {
    pub verdicts: Vec<Option<bool>>,
    pub delay: Duration,
}

impl Validator for DelayedValidator {
    fn validate(&self, _expressions: &[String]) -> Result<ValidationReport> {
        std::thread::sleep(self.delay);
        Ok(ValidationReport {
            valid: None,
            per_expression: self.verdicts.clone(),
        })
    }
}

pub fn fast_config() -> EngineConfig {
    EngineConfig {
        draw_debounce_ms: 40,
        erase_debounce_ms: 0,
        recognition_timeout_ms: 2_000,
        validation_timeout_ms: 2_000,
        ..EngineConfig::default()
    }
}

pub struct Harness {
    pub engine: InkEngine,
    pub host: Arc<RecordingHost>,
    pub slots: Vec<SlotId>,
}

/// Engine with `lines` stacked slots, each 400x40 in the shared space.
pub async fn harness(lines: usize, recognizer: Arc<dyn Recognizer>) -> Harness {
    harness_with(fast_config(), lines, recognizer).await
}

pub async fn harness_with(
    config: EngineConfig,
    lines: usize,
    recognizer: Arc<dyn Recognizer>,
) -> Harness {
    let host = Arc::new(RecordingHost::default());
    let engine = InkEngine::new(config, recognizer, host.clone());
    let mut slots = Vec::with_capacity(lines);
    for index in 0..lines {
        let slot = engine.add_slot(MemorySurface::boxed()).await;
        engine
            .set_slot_rect(slot, Rect::new(0.0, index as f64 * 40.0, 400.0, 40.0))
            .await
            .unwrap();
        slots.push(slot);
    }
    Harness {
        engine,
        host,
        slots,
    }
}

/// Horizontal stroke from (x, y) to (x + 30, y).
pub fn dash(x: f64, y: f64) -> Vec<Point> {
    vec![
        Point::new(x, y),
        Point::new(x + 10.0, y),
        Point::new(x + 20.0, y),
        Point::new(x + 30.0, y),
    ]
}

pub async fn draw(engine: &InkEngine, slot: SlotId, x: f64, y: f64) -> StrokeId {
    engine
        .commit_stroke(slot, dash(x, y), StrokeStyle::default())
        .await
        .unwrap()
        .expect("non-empty gesture")
}

pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(250)).await;
}
