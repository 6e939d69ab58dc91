//! Neon Survivor - a survivor-style arcade game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, weapons, collisions, progression)
//! - `renderer`: Depth-ordered render pass and WebGPU pipeline
//! - `host`: Frame loop glue between the simulation and its collaborators
//! - `persistence`: Key-value stores, save record and run snapshots
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod host;
pub mod input;
pub mod persistence;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one tick per 60 Hz display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Ticks per simulated second
    pub const TICKS_PER_SECOND: u32 = 60;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Smallest viewport the game lays itself out for
    pub const MIN_VIEWPORT_WIDTH: f32 = 320.0;
    pub const MIN_VIEWPORT_HEIGHT: f32 = 320.0;

    /// Storage namespace for the persisted save record
    pub const SAVE_KEY: &str = "neon_survivor_save";
    /// Storage key for an in-progress run snapshot
    pub const RUN_KEY: &str = "neon_survivor_run";
    /// Storage key for player preferences
    pub const SETTINGS_KEY: &str = "neon_survivor_settings";
}

/// Screen-space drawing area; the player sits at its centre
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Create a viewport, clamped to the minimum supported size
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(consts::MIN_VIEWPORT_WIDTH),
            height: height.max(consts::MIN_VIEWPORT_HEIGHT),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Distance from the centre to a corner
    #[inline]
    pub fn half_diagonal(&self) -> f32 {
        Vec2::new(self.width, self.height).length() / 2.0
    }

    /// Whether any part of a circle lies inside the viewport rectangle
    pub fn contains_circle(&self, pos: Vec2, radius: f32) -> bool {
        pos.x + radius >= 0.0
            && pos.x - radius <= self.width
            && pos.y + radius >= 0.0
            && pos.y - radius <= self.height
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(960.0, 640.0)
    }
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Unit vector from `from` toward `to` (zero when coincident)
#[inline]
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Rotate `current` toward `desired` by at most `max_turn` radians, keeping its length
pub fn rotate_toward(current: Vec2, desired: Vec2, max_turn: f32) -> Vec2 {
    let speed = current.length();
    if speed == 0.0 || desired == Vec2::ZERO {
        return current;
    }
    let from = current.y.atan2(current.x);
    let to = desired.y.atan2(desired.x);
    let delta = normalize_angle(to - from).clamp(-max_turn, max_turn);
    polar_to_cartesian(speed, from + delta)
}

/// Circle-circle overlap with the combined radius scaled by `fudge`
#[inline]
pub fn circles_overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32, fudge: f32) -> bool {
    distance(a, b) < (a_radius + b_radius) * fudge
}
