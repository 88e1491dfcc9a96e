//! Slot arena: owns every slot record and its surface, keyed by `SlotId`.

use std::collections::HashMap;

use anyhow::{anyhow, Result};

use crate::models::{LineSnapshot, PathData, Slot, SlotId, SlotIndex};
use crate::surface::DrawableSurface;

struct SlotEntry {
    slot: Slot,
    surface: Option<Box<dyn DrawableSurface>>,
}

/// What changed on a slot after its strokes were mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationEffect {
    pub slot: SlotId,
    pub index: SlotIndex,
    pub revision: u64,
    pub is_empty: bool,
    /// The slot lost recognized text because it became empty.
    pub expression_cleared: bool,
    pub validation_cleared: bool,
}

#[derive(Default)]
pub struct SlotRegistry {
    entries: HashMap<SlotId, SlotEntry>,
    order: Vec<SlotId>,
    next_id: u32,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, surface: Box<dyn DrawableSurface>) -> SlotId {
        let id = SlotId(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            id,
            SlotEntry {
                slot: Slot::new(id),
                surface: Some(surface),
            },
        );
        self.order.push(id);
        id
    }

    pub fn remove(&mut self, id: SlotId) -> Option<Slot> {
        let entry = self.entries.remove(&id)?;
        self.order.retain(|existing| *existing != id);
        Some(entry.slot)
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Slot ids in line order.
    pub fn ids(&self) -> &[SlotId] {
        &self.order
    }

    pub fn index_of(&self, id: SlotId) -> Option<SlotIndex> {
        self.order.iter().position(|existing| *existing == id)
    }

    pub fn id_at(&self, index: SlotIndex) -> Option<SlotId> {
        self.order.get(index).copied()
    }

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.entries.get(&id).map(|entry| &entry.slot)
    }

    pub fn slot_mut(&mut self, id: SlotId) -> Option<&mut Slot> {
        self.entries.get_mut(&id).map(|entry| &mut entry.slot)
    }

    pub fn require_slot(&self, id: SlotId) -> Result<&Slot> {
        self.slot(id).ok_or_else(|| anyhow!("unknown slot {id}"))
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.entries.get(id).map(|entry| &entry.slot))
    }

    pub fn surface(&self, id: SlotId) -> Option<&dyn DrawableSurface> {
        self.entries
            .get(&id)
            .and_then(|entry| entry.surface.as_deref())
    }

    pub fn surface_mut(&mut self, id: SlotId) -> Option<&mut (dyn DrawableSurface + 'static)> {
        self.entries
            .get_mut(&id)
            .and_then(|entry| entry.surface.as_deref_mut())
    }

    pub fn has_surface(&self, id: SlotId) -> bool {
        self.surface(id).is_some()
    }

    pub fn attach_surface(
        &mut self,
        id: SlotId,
        surface: Box<dyn DrawableSurface>,
    ) -> Result<Option<Box<dyn DrawableSurface>>> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or_else(|| anyhow!("unknown slot {id}"))?;
        Ok(entry.surface.replace(surface))
    }

    pub fn detach_surface(&mut self, id: SlotId) -> Option<Box<dyn DrawableSurface>> {
        self.entries
            .get_mut(&id)
            .and_then(|entry| entry.surface.take())
    }

    /// Current strokes of a slot; empty when the slot or its surface is gone.
    pub fn strokes(&self, id: SlotId) -> PathData {
        self.surface(id)
            .map(|surface| surface.export_strokes())
            .unwrap_or_default()
    }

    pub fn line_snapshot(&self, id: SlotId) -> Option<LineSnapshot> {
        let slot = self.slot(id)?;
        Some(LineSnapshot {
            symbolic_text: slot.symbolic_text.clone(),
            confidence: slot.confidence,
            strokes: self.strokes(id),
            validation: slot.validation,
        })
    }

    pub fn line_snapshots(&self) -> Vec<LineSnapshot> {
        self.order
            .iter()
            .filter_map(|id| self.line_snapshot(*id))
            .collect()
    }

    /// Recomputes derived state after a stroke mutation: bumps the revision,
    /// refreshes bounds, drops stale validation and clears recognition when
    /// the slot has no strokes left.
    pub fn mark_mutated(&mut self, id: SlotId) -> Option<MutationEffect> {
        let index = self.index_of(id)?;
        let entry = self.entries.get_mut(&id)?;
        let (bounds, is_empty) = match entry.surface.as_deref() {
            Some(surface) => (surface.bounds(), surface.is_empty()),
            None => (None, true),
        };

        let slot = &mut entry.slot;
        slot.revision += 1;
        slot.bounds = bounds;
        let validation_cleared = slot.validation.take().is_some();

        let expression_cleared = if is_empty {
            let had_text = slot.symbolic_text.is_some();
            slot.clear_recognition();
            had_text
        } else {
            false
        };

        Some(MutationEffect {
            slot: id,
            index,
            revision: slot.revision,
            is_empty,
            expression_cleared,
            validation_cleared,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Point, Rect, Stroke, StrokeId, StrokeStyle};
    use crate::surface::MemorySurface;

    fn stroke(id: u64, owner: SlotId, points: &[(f64, f64)]) -> Stroke {
        Stroke {
            id: StrokeId(id),
            owner,
            points: points.iter().map(|(x, y)| Point::new(*x, *y)).collect(),
            style: StrokeStyle::default(),
        }
    }

    #[test]
    fn ids_follow_insertion_order_and_survive_removal() {
        let mut registry = SlotRegistry::new();
        let a = registry.insert(MemorySurface::boxed());
        let b = registry.insert(MemorySurface::boxed());
        let c = registry.insert(MemorySurface::boxed());

        assert_eq!(registry.ids(), &[a, b, c]);
        registry.remove(b);
        assert_eq!(registry.ids(), &[a, c]);
        assert_eq!(registry.index_of(c), Some(1));

        let d = registry.insert(MemorySurface::boxed());
        assert_ne!(d, b);
    }

    #[test]
    fn emptied_slot_drops_bounds_and_recognition() {
        let mut registry = SlotRegistry::new();
        let id = registry.insert(MemorySurface::boxed());
        registry
            .surface_mut(id)
            .expect("surface")
            .add_stroke(stroke(1, id, &[(0.0, 0.0), (4.0, 3.0)]));

        let effect = registry.mark_mutated(id).expect("known slot");
        assert!(!effect.is_empty);
        assert_eq!(
            registry.slot(id).and_then(|slot| slot.bounds),
            Some(Rect::new(0.0, 0.0, 4.0, 3.0))
        );

        {
            let slot = registry.slot_mut(id).expect("slot");
            slot.symbolic_text = Some("x".into());
            slot.confidence = Some(0.9);
        }

        registry.surface_mut(id).expect("surface").remove_stroke(StrokeId(1));
        let effect = registry.mark_mutated(id).expect("known slot");
        assert!(effect.is_empty);
        assert!(effect.expression_cleared);

        let slot = registry.slot(id).expect("slot");
        assert_eq!(slot.bounds, None);
        assert_eq!(slot.symbolic_text, None);
        assert_eq!(slot.confidence, None);
        assert_eq!(slot.revision, 2);
    }

    #[test]
    fn detached_slot_reports_no_strokes() {
        let mut registry = SlotRegistry::new();
        let id = registry.insert(MemorySurface::boxed());
        registry
            .surface_mut(id)
            .expect("surface")
            .add_stroke(stroke(1, id, &[(1.0, 1.0)]));

        assert!(registry.detach_surface(id).is_some());
        assert!(!registry.has_surface(id));
        assert!(registry.strokes(id).is_empty());
    }
}
