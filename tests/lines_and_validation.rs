mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use common::{draw, harness, settle, CountingRecognizer, DelayedValidator};
use mathink::{ValidationReport, ValidationState, Validator};

struct FixedValidator(Vec<Option<bool>>);

impl Validator for FixedValidator {
    fn validate(&self, expressions: &[String]) -> Result<ValidationReport> {
        assert_eq!(expressions.len(), self.0.len());
        Ok(ValidationReport {
            valid: Some(self.0.iter().all(|entry| *entry == Some(true))),
            per_expression: self.0.clone(),
        })
    }
}

struct SlowValidator;

impl Validator for SlowValidator {
    fn validate(&self, _expressions: &[String]) -> Result<ValidationReport> {
        std::thread::sleep(Duration::from_millis(300));
        Ok(ValidationReport::default())
    }
}

#[tokio::test]
async fn focus_change_records_before_and_after() {
    let h = harness(2, Arc::new(CountingRecognizer::default())).await;

    draw(&h.engine, h.slots[0], 0.0, 20.0).await;
    settle().await;

    assert!(h.engine.notify_focus_changed(None, 0).await.is_none());
    assert!(h.engine.notify_focus_changed(Some(0), 0).await.is_none());

    let first = h.engine.notify_focus_changed(Some(0), 1).await.unwrap();
    assert_eq!(first.from, Some(0));
    assert_eq!(first.to, 1);
    assert_eq!(first.snapshot_before.symbolic_text, None);
    assert_eq!(first.snapshot_after.symbolic_text.as_deref(), Some("s1"));

    draw(&h.engine, h.slots[0], 50.0, 20.0).await;
    settle().await;
    let second = h.engine.notify_focus_changed(Some(0), 1).await.unwrap();
    assert_eq!(second.snapshot_before, first.snapshot_after);
    assert_eq!(second.snapshot_after.symbolic_text.as_deref(), Some("s2"));

    let published = h.host.last_lines_event().unwrap();
    assert_eq!(published.session_id, h.engine.session_id());
    assert_eq!(published.history.len(), 2);
    assert_eq!(published.current.len(), 2);
    h.engine.shutdown();
}

#[tokio::test]
async fn leaving_an_empty_line_records_nothing() {
    let h = harness(2, Arc::new(CountingRecognizer::default())).await;

    assert!(h.engine.notify_focus_changed(Some(1), 0).await.is_none());
    assert!(h.engine.lines_data().await.history.is_empty());
}

#[tokio::test]
async fn validation_skips_empty_lines_and_maps_back() {
    let h = harness(3, Arc::new(CountingRecognizer::default())).await;

    draw(&h.engine, h.slots[0], 0.0, 20.0).await;
    draw(&h.engine, h.slots[2], 0.0, 20.0).await;
    settle().await;

    let compacted = h.engine.compact_non_empty().await;
    assert_eq!(compacted.expressions, vec!["s1".to_string(), "s1".to_string()]);
    assert_eq!(compacted.index_map, vec![0, 2]);

    let report = h
        .engine
        .validate_with(Arc::new(FixedValidator(vec![Some(true), Some(false)])))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.valid, Some(false));

    let decorations = h.engine.decorations().await;
    assert_eq!(decorations.len(), 2);
    assert_eq!(decorations[0].index, 0);
    assert_eq!(decorations[0].state, ValidationState::Valid);
    assert_eq!(decorations[1].index, 2);
    assert_eq!(decorations[1].state, ValidationState::Invalid);

    let bounds = h.engine.slot(h.slots[2]).await.unwrap().bounds.unwrap();
    assert!(decorations[1].underline.y > bounds.max_y());
    assert_eq!(h.host.last_decorations(), Some(decorations));
    h.engine.shutdown();
}

#[tokio::test]
async fn editing_a_line_drops_its_decoration() {
    let h = harness(2, Arc::new(CountingRecognizer::default())).await;

    draw(&h.engine, h.slots[0], 0.0, 20.0).await;
    draw(&h.engine, h.slots[1], 0.0, 20.0).await;
    settle().await;
    h.engine
        .validate_with(Arc::new(FixedValidator(vec![Some(true), None])))
        .await
        .unwrap();
    assert_eq!(h.engine.decorations().await.len(), 2);

    draw(&h.engine, h.slots[0], 50.0, 20.0).await;

    let decorations = h.engine.decorations().await;
    assert_eq!(decorations.len(), 1);
    assert_eq!(decorations[0].index, 1);
    assert_eq!(decorations[0].state, ValidationState::Indeterminate);
    h.engine.shutdown();
}

fn delayed(verdicts: Vec<Option<bool>>) -> Arc<DelayedValidator> {
    Arc::new(DelayedValidator {
        verdicts,
        delay: Duration::from_millis(300),
    })
}

#[tokio::test]
async fn verdict_for_a_line_edited_during_validation_is_dropped() {
    let h = harness(2, Arc::new(CountingRecognizer::default())).await;
    draw(&h.engine, h.slots[0], 0.0, 20.0).await;
    draw(&h.engine, h.slots[1], 0.0, 20.0).await;
    settle().await;

    let engine = h.engine.clone();
    let validation = tokio::spawn(async move {
        engine
            .validate_with(delayed(vec![Some(true), Some(true)]))
            .await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    draw(&h.engine, h.slots[0], 50.0, 20.0).await;
    validation.await.unwrap().unwrap();

    assert_eq!(h.engine.slot(h.slots[0]).await.unwrap().validation, None);
    assert_eq!(
        h.engine.slot(h.slots[1]).await.unwrap().validation,
        Some(ValidationState::Valid)
    );
    let decorations: Vec<_> = h
        .engine
        .decorations()
        .await
        .iter()
        .map(|d| (d.index, d.state))
        .collect();
    assert_eq!(decorations, vec![(1, ValidationState::Valid)]);
    h.engine.shutdown();
}

#[tokio::test]
async fn verdicts_follow_their_lines_when_one_is_removed_during_validation() {
    let h = harness(3, Arc::new(CountingRecognizer::default())).await;
    for slot in &h.slots {
        draw(&h.engine, *slot, 0.0, 20.0).await;
    }
    settle().await;

    let engine = h.engine.clone();
    let validation = tokio::spawn(async move {
        engine
            .validate_with(delayed(vec![Some(true), Some(true), Some(false)]))
            .await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.engine.remove_slot(h.slots[0]).await.unwrap();
    validation.await.unwrap().unwrap();

    assert_eq!(
        h.engine.slot(h.slots[1]).await.unwrap().validation,
        Some(ValidationState::Valid)
    );
    assert_eq!(
        h.engine.slot(h.slots[2]).await.unwrap().validation,
        Some(ValidationState::Invalid)
    );
    let decorations: Vec<_> = h
        .engine
        .decorations()
        .await
        .iter()
        .map(|d| (d.slot, d.index, d.state))
        .collect();
    assert_eq!(
        decorations,
        vec![
            (h.slots[1], 0, ValidationState::Valid),
            (h.slots[2], 1, ValidationState::Invalid),
        ]
    );
    h.engine.shutdown();
}

#[tokio::test]
async fn nothing_to_validate_without_recognized_text() {
    let h = harness(2, Arc::new(CountingRecognizer::default())).await;

    let report = h
        .engine
        .validate_with(Arc::new(FixedValidator(Vec::new())))
        .await
        .unwrap();
    assert!(report.is_none());
}

#[tokio::test]
async fn slow_validator_times_out() {
    let recognizer = Arc::new(CountingRecognizer::default());
    let host = Arc::new(common::RecordingHost::default());
    let config = mathink::EngineConfig {
        validation_timeout_ms: 50,
        ..common::fast_config()
    };
    let engine = mathink::InkEngine::new(config, recognizer, host);
    let slot = engine.add_slot(mathink::MemorySurface::boxed()).await;

    draw(&engine, slot, 0.0, 20.0).await;
    settle().await;

    assert!(engine.validate_with(Arc::new(SlowValidator)).await.is_err());
    assert!(engine.decorations().await.is_empty());
    engine.shutdown();
}
