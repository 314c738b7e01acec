use serde::{Deserialize, Serialize};

// defaults mirror the html page the demo ships with
mod defaults {
    pub const CANVAS_ID: &str = "canvas";
    pub const WIDTH: u32 = 600;
    pub const HEIGHT: u32 = 600;
    pub const UPDATES_PER_SECOND: f64 = 60.0;
    pub const MAX_STEPS_PER_FRAME: u32 = 5;
    pub const ANIMATION_FPS: f64 = 20.0;
    pub const CLEAR_COLOR: &str = "#78c8ff";
}

/// Host settings for the canvas, the game loop cadence and animation
/// fallbacks.
///
/// Every field has a default so a partial `stage.json` is enough :
/// ```json
/// { "width": 800, "updates_per_second": 30 }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StageConfig {
    pub canvas_id: String,
    pub width: u32,
    pub height: u32,
    pub updates_per_second: f64,
    pub max_steps_per_frame: u32,
    pub default_animation_fps: f64,
    pub clear_color: String,
}

impl Default for StageConfig {
    fn default() -> Self {
        StageConfig {
            canvas_id: defaults::CANVAS_ID.to_string(),
            width: defaults::WIDTH,
            height: defaults::HEIGHT,
            updates_per_second: defaults::UPDATES_PER_SECOND,
            max_steps_per_frame: defaults::MAX_STEPS_PER_FRAME,
            default_animation_fps: defaults::ANIMATION_FPS,
            clear_color: defaults::CLEAR_COLOR.to_string(),
        }
    }
}

impl StageConfig {
    /// Replace values the loop can't run with by their defaults.
    pub fn validate(mut self) -> Self {
        if !(self.updates_per_second.is_finite() && self.updates_per_second > 0.0) {
            log::warn!(
                "updates_per_second {} is not usable, falling back to {}",
                self.updates_per_second,
                defaults::UPDATES_PER_SECOND
            );
            self.updates_per_second = defaults::UPDATES_PER_SECOND;
        }
        if !(self.default_animation_fps.is_finite() && self.default_animation_fps > 0.0) {
            log::warn!(
                "default_animation_fps {} is not usable, falling back to {}",
                self.default_animation_fps,
                defaults::ANIMATION_FPS
            );
            self.default_animation_fps = defaults::ANIMATION_FPS;
        }
        self.max_steps_per_frame = self.max_steps_per_frame.max(1);
        if self.canvas_id.trim().is_empty() {
            self.canvas_id = defaults::CANVAS_ID.to_string();
        }
        self
    }

    /// Length of one fixed update step in seconds.
    pub fn step_seconds(&self) -> f64 {
        1.0 / self.updates_per_second
    }
}
