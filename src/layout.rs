//! Adaptive slot sizing.
//!
//! A line grows to cover ink that runs past its bottom edge, unless the next
//! line already holds ink; in that case the overflow belongs to the
//! neighbour visually and the line keeps its base height.

use crate::engine::EngineConfig;
use crate::models::Rect;

/// Height for every line, in line order. `bounds[i]` is line `i`'s ink
/// bounds in its local frame.
pub fn slot_heights(config: &EngineConfig, bounds: &[Option<Rect>]) -> Vec<f64> {
    bounds
        .iter()
        .enumerate()
        .map(|(index, current)| {
            let next_has_ink = bounds
                .get(index + 1)
                .map(|next| next.is_some())
                .unwrap_or(false);

            match current {
                Some(ink) if !next_has_ink => {
                    let wanted = ink.max_y() + config.expand_padding;
                    wanted.clamp(config.base_line_height, config.max_line_height.max(config.base_line_height))
                }
                _ => config.base_line_height,
            }
        })
        .collect()
}
