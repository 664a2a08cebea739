//! Frame timing for the viewer
//!
//! Tracks elapsed time and delta time so the idle animation advances at a
//! steady rate regardless of how often frames are requested.

use serde::{Deserialize, Serialize};

/// Configuration for the frame clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Multiplier applied to real elapsed time
    pub time_scale: f32,
    /// Maximum delta time accepted per frame, so a stalled host does not
    /// make the animation jump
    pub max_delta_time: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_delta_time: 0.25,
        }
    }
}

/// Elapsed-time tracking for rendered frames
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    /// Configuration
    pub config: ClockConfig,
    /// Time since the clock started, in seconds
    pub elapsed: f64,
    /// Delta time for this frame (clamped and scaled)
    pub delta_time: f32,
    /// Frame counter
    pub frame_count: u64,
}

impl FrameClock {
    /// Create a new clock with custom config
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Advance the clock with the raw delta from the previous frame
    pub fn tick(&mut self, raw_delta: f32) {
        self.frame_count += 1;

        if !raw_delta.is_finite() {
            self.delta_time = 0.0;
            return;
        }

        let clamped = raw_delta.clamp(0.0, self.config.max_delta_time);
        self.delta_time = clamped * self.config.time_scale;
        self.elapsed += self.delta_time as f64;
    }

    /// Elapsed seconds as f32, for animation math
    pub fn seconds(&self) -> f32 {
        self.elapsed as f32
    }

    /// Restart from zero, keeping the configuration
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.delta_time = 0.0;
        self.frame_count = 0;
    }
}
