use std::collections::BTreeSet;

use crate::history::{capture, HistoryManager};
use crate::models::{Point, Rect, SlotId, Stroke};
use crate::registry::SlotRegistry;
use crate::transform::RectCache;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Result of an erase gesture that removed at least one stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct EraseOutcome {
    pub origin: SlotId,
    /// Every slot the gesture intersected, in id order.
    pub slots: Vec<SlotId>,
    pub erased: Vec<(SlotId, Vec<Stroke>)>,
}

impl EraseOutcome {
    pub fn erased_count(&self) -> usize {
        self.erased.iter().map(|(_, strokes)| strokes.len()).sum()
    }
}

/// Fans an eraser gesture out to every slot it visually touches and commits
/// the whole gesture as one history operation.
#[derive(Debug, Clone, Copy)]
pub struct EraseCoordinator {
    /// Slack added around each slot rect so ink drawn past a slot's box is
    /// still found from a neighbouring slot.
    tolerance: f64,
    radius: f64,
}

impl EraseCoordinator {
    pub fn new(tolerance: f64, radius: f64) -> Self {
        Self { tolerance, radius }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Slots hit by `path` (given in `origin`-local coordinates). Always
    /// contains `origin`. A single transformed point inside another slot's
    /// inflated rect is enough.
    pub fn intersected_slots(
        &self,
        registry: &SlotRegistry,
        rects: &RectCache,
        path: &[Point],
        origin: SlotId,
    ) -> BTreeSet<SlotId> {
        let mut hits = BTreeSet::new();
        hits.insert(origin);

        if rects.get(origin).is_none() {
            log_warn!("no rect cached for erase origin {}; erasing origin only", origin);
            return hits;
        }

        for candidate in registry.ids().iter().copied() {
            if candidate == origin {
                continue;
            }
            let Some(rect) = rects.get(candidate) else {
                continue;
            };

            let local_bounds = Rect::new(0.0, 0.0, rect.width, rect.height).inflate(self.tolerance);
            let touched = path
                .iter()
                .any(|point| local_bounds.contains(rects.transform(*point, origin, candidate)));
            if touched {
                hits.insert(candidate);
            }
        }

        hits
    }

    /// Erases on the origin first, then on every other intersected slot with
    /// the path mapped into that slot's frame. A single `CrossCanvasErase` is
    /// committed once every slot has been processed. Gestures that remove
    /// nothing are not recorded.
    pub fn perform_erase(
        &self,
        registry: &mut SlotRegistry,
        rects: &RectCache,
        history: &mut HistoryManager,
        path: &[Point],
        origin: SlotId,
    ) -> Option<EraseOutcome> {
        if path.is_empty() {
            return None;
        }

        let targets: Vec<SlotId> = self
            .intersected_slots(registry, rects, path, origin)
            .into_iter()
            .filter(|slot| {
                let present = registry.has_surface(*slot);
                if !present {
                    log_warn!("erase skipped {}: surface is gone", slot);
                }
                present
            })
            .collect();
        if targets.is_empty() {
            return None;
        }

        let before = capture(registry, &targets);

        // Origin first, then the rest in slot order.
        let ordered = std::iter::once(origin)
            .filter(|slot| targets.contains(slot))
            .chain(targets.iter().copied().filter(|slot| *slot != origin));

        let mut erased = Vec::new();
        for slot in ordered {
            let local_path = rects.transform_path(path, origin, slot);
            let Some(surface) = registry.surface_mut(slot) else {
                continue;
            };
            let removed = surface.erase_path(&local_path, self.radius);
            if !removed.is_empty() {
                log_debug!("erase removed {} stroke(s) from {}", removed.len(), slot);
                erased.push((slot, removed));
            }
        }

        if erased.is_empty() {
            log_debug!("erase gesture on {} touched no ink", origin);
            return None;
        }

        history.commit_erase(targets.clone(), before);

        let outcome = EraseOutcome {
            origin,
            slots: targets,
            erased,
        };
        log_info!(
            "erase from {} removed {} stroke(s) across {} slot(s)",
            origin,
            outcome.erased_count(),
            outcome.slots.len()
        );
        Some(outcome)
    }
}
