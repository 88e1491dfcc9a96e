//! Slot-to-slot coordinate mapping through cached screen rects.

use std::collections::HashMap;

use crate::models::{Point, Rect, SlotId};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Last known screen rect of every slot. Refreshed by the host after layout
/// passes and dynamic resizes.
#[derive(Debug, Clone, Default)]
pub struct RectCache {
    rects: HashMap<SlotId, Rect>,
}

impl RectCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, slot: SlotId, rect: Rect) {
        self.rects.insert(slot, rect);
    }

    pub fn remove(&mut self, slot: SlotId) -> Option<Rect> {
        self.rects.remove(&slot)
    }

    pub fn get(&self, slot: SlotId) -> Option<Rect> {
        self.rects.get(&slot).copied()
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Maps `point` from `from`-local coordinates to `to`-local coordinates.
    /// Returns the point unchanged when either rect is unknown.
    pub fn transform(&self, point: Point, from: SlotId, to: SlotId) -> Point {
        if from == to {
            return point;
        }

        match (self.get(from), self.get(to)) {
            (Some(from_rect), Some(to_rect)) => {
                // local -> shared frame -> target local
                let shared = point.offset(from_rect.x, from_rect.y);
                shared.offset(-to_rect.x, -to_rect.y)
            }
            (from_rect, to_rect) => {
                log_warn!(
                    "missing rect for transform {} -> {} (from cached: {}, to cached: {}); using point as-is",
                    from,
                    to,
                    from_rect.is_some(),
                    to_rect.is_some()
                );
                point
            }
        }
    }

    pub fn transform_path(&self, path: &[Point], from: SlotId, to: SlotId) -> Vec<Point> {
        path.iter()
            .map(|point| self.transform(*point, from, to))
            .collect()
    }
}
