use crate::flyer::Flyer;
use crate::obstacle::{Obstacle, ObstacleField};
use crate::oracle::Inputs;

/// Index of the obstacle flyers steer for this tick.
///
/// The front obstacle, unless the lead flyer is already clear of its right
/// edge and another obstacle is queued behind it. Looking one obstacle ahead
/// gives flyers time to line up with the next gap.
pub fn target_obstacle(field: &ObstacleField, lead_x: f32) -> usize {
    match field.front() {
        Some(front) if field.len() > 1 && lead_x > front.x + field.width() as f32 => 1,
        _ => 0,
    }
}

/// Sensor vector for one flyer against its target obstacle.
pub fn flyer_inputs(flyer: &Flyer, target: &Obstacle) -> Inputs {
    [
        flyer.y,
        (flyer.y - target.gap_center).abs(),
        (flyer.y - target.bottom).abs(),
    ]
}
