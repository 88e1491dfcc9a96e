use std::time::Duration;

use serde::{Deserialize, Serialize};

const ENABLE_LOGS: bool = true;

use crate::log_warn;
use crate::validation::UnderlineStyle;

/// Tunable thresholds for the ink engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Delay before recognizing a slot after a stroke lands on it
    pub draw_debounce_ms: u64,

    /// Delay before recognizing a slot after an erase, undo or redo changed it
    pub erase_debounce_ms: u64,

    /// Slack around each slot rect when looking for cross-slot erase targets
    pub erase_tolerance: f64,

    /// Eraser hit radius in slot-local units
    pub eraser_radius: f64,

    /// External call timeouts
    pub recognition_timeout_ms: u64,
    pub validation_timeout_ms: u64,

    /// Underline decoration placement below a slot's ink
    pub underline_offset: f64,
    pub underline_thickness: f64,

    /// Adaptive slot sizing
    pub base_line_height: f64,
    pub expand_padding: f64,
    pub max_line_height: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            draw_debounce_ms: 150,
            erase_debounce_ms: 0,
            erase_tolerance: 100.0,
            eraser_radius: 8.0,
            recognition_timeout_ms: 10_000,
            validation_timeout_ms: 10_000,
            underline_offset: 4.0,
            underline_thickness: 2.0,
            base_line_height: 40.0,
            expand_padding: 16.0,
            max_line_height: 240.0,
        }
    }
}

impl EngineConfig {
    pub fn draw_debounce(&self) -> Duration {
        Duration::from_millis(self.draw_debounce_ms)
    }

    pub fn erase_debounce(&self) -> Duration {
        Duration::from_millis(self.erase_debounce_ms)
    }

    pub fn recognition_timeout(&self) -> Duration {
        Duration::from_millis(self.recognition_timeout_ms)
    }

    pub fn validation_timeout(&self) -> Duration {
        Duration::from_millis(self.validation_timeout_ms)
    }

    pub fn underline_style(&self) -> UnderlineStyle {
        UnderlineStyle {
            offset: self.underline_offset,
            thickness: self.underline_thickness,
        }
    }

    /// Applies `MATHINK_DEBOUNCE_MS` (draw debounce) and
    /// `MATHINK_ERASE_TOLERANCE` when set. Unparseable values are ignored.
    pub fn from_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var("MATHINK_DEBOUNCE_MS") {
            match value.trim().parse::<u64>() {
                Ok(ms) => self.draw_debounce_ms = ms,
                Err(_) => log_warn!("ignoring MATHINK_DEBOUNCE_MS={value:?}: not a number"),
            }
        }

        if let Ok(value) = std::env::var("MATHINK_ERASE_TOLERANCE") {
            match value.trim().parse::<f64>() {
                Ok(tolerance) if tolerance >= 0.0 => self.erase_tolerance = tolerance,
                _ => log_warn!("ignoring MATHINK_ERASE_TOLERANCE={value:?}"),
            }
        }

        self
    }
}
