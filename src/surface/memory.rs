use crate::models::{PathData, Point, Rect, Stroke, StrokeId};

use super::DrawableSurface;

/// Surface that keeps its strokes in memory. Used when the host has no
/// canvas of its own, and by tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    strokes: Vec<Stroke>,
    erase_mode: bool,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed() -> Box<dyn DrawableSurface> {
        Box::new(Self::new())
    }

    pub fn erase_mode(&self) -> bool {
        self.erase_mode
    }
}

impl DrawableSurface for MemorySurface {
    fn add_stroke(&mut self, stroke: Stroke) -> StrokeId {
        let id = stroke.id;
        self.strokes.push(stroke);
        id
    }

    fn remove_stroke(&mut self, id: StrokeId) -> Option<Stroke> {
        let position = self.strokes.iter().position(|stroke| stroke.id == id)?;
        Some(self.strokes.remove(position))
    }

    fn export_strokes(&self) -> PathData {
        PathData::new(self.strokes.clone())
    }

    fn import_strokes(&mut self, data: PathData) {
        self.strokes = data.strokes;
    }

    fn bounds(&self) -> Option<Rect> {
        Rect::from_points(self.strokes.iter().flat_map(|stroke| stroke.points.iter()))
    }

    fn set_erase_mode(&mut self, enabled: bool) {
        self.erase_mode = enabled;
    }

    fn erase_path(&mut self, path: &[Point], radius: f64) -> Vec<Stroke> {
        if path.is_empty() {
            return Vec::new();
        }

        let (erased, kept): (Vec<Stroke>, Vec<Stroke>) = std::mem::take(&mut self.strokes)
            .into_iter()
            .partition(|stroke| stroke_touches_path(stroke, path, radius));
        self.strokes = kept;
        erased
    }

    fn stroke_count(&self) -> usize {
        self.strokes.len()
    }
}

fn stroke_touches_path(stroke: &Stroke, path: &[Point], radius: f64) -> bool {
    // Half the stroke width counts as ink too.
    let reach = radius + stroke.style.width / 2.0;
    let reach_sq = reach * reach;

    match stroke.points.as_slice() {
        [] => false,
        [single] => path.iter().any(|p| p.distance_sq(*single) <= reach_sq),
        points => points.windows(2).any(|segment| {
            path.iter()
                .any(|p| distance_to_segment_sq(*p, segment[0], segment[1]) <= reach_sq)
        }),
    }
}

fn distance_to_segment_sq(point: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return point.distance_sq(a);
    }

    let t = (((point.x - a.x) * dx + (point.y - a.y) * dy) / length_sq).clamp(0.0, 1.0);
    point.distance_sq(Point::new(a.x + t * dx, a.y + t * dy))
}
