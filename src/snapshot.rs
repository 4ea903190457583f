use serde::Serialize;

use crate::flyer::AgentId;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlyerView {
    pub id: AgentId,
    pub x: f32,
    pub y: f32,
    pub tilt: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObstacleView {
    pub x: f32,
    pub gap_center: f32,
    pub top: f32,
    pub bottom: f32,
    pub passed: bool,
}

/// Read-only copy of the simulation after a completed tick. Owns its data,
/// so holding one never blocks the next tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub score: u32,
    /// Live flyers in population order.
    pub flyers: Vec<FlyerView>,
    /// Live obstacles, oldest first.
    pub obstacles: Vec<ObstacleView>,
}

impl Snapshot {
    pub fn alive(&self) -> usize {
        self.flyers.len()
    }
}
