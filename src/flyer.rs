use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a population member. Assigned in construction order
/// and never reused within an evaluation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Flyer {
    /// Fixed for the flyer's lifetime; obstacles scroll past it.
    pub x: f32,
    pub y: f32,
    pub velocity: f32,
    /// Ticks since the last impulse.
    pub tick_count: u32,
    /// `y` at the last impulse, used only by the tilt projection.
    pub jump_height: f32,
    /// Cosmetic tilt in degrees. Never read by physics or collision.
    pub tilt: f32,
}

impl Flyer {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            velocity: 0.0,
            tick_count: 0,
            jump_height: y,
            tilt: 0.0,
        }
    }

    /// Bottom edge given the silhouette height.
    pub fn bottom(&self, height: u32) -> f32 {
        self.y + height as f32
    }
}
