use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{Result, SimError};

/// Events that move a member's fitness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitnessEvent {
    /// Alive at the decision phase of a tick.
    Survived,
    /// Alive when some flyer cleared an obstacle this tick.
    ObstaclePassed,
    /// Hit an obstacle.
    Collided,
    /// Left the field through the floor or the ceiling.
    OutOfBounds,
}

/// Reward constants the training loop relies on. Policy, not physics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub survival_reward: f64,
    pub pass_reward: f64,
    /// Fitness is overwritten with this value on collision.
    pub collision_fitness: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            survival_reward: config::SURVIVAL_REWARD,
            pass_reward: config::PASS_REWARD,
            collision_fitness: config::COLLISION_FITNESS,
        }
    }
}

impl ScoringPolicy {
    /// Fitness after `event`, given the fitness before it.
    pub fn apply(&self, event: FitnessEvent, fitness: f64) -> f64 {
        match event {
            FitnessEvent::Survived => fitness + self.survival_reward,
            FitnessEvent::ObstaclePassed => fitness + self.pass_reward,
            FitnessEvent::Collided => self.collision_fitness,
            FitnessEvent::OutOfBounds => fitness,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (field, v) in [
            ("scoring.survival_reward", self.survival_reward),
            ("scoring.pass_reward", self.pass_reward),
            ("scoring.collision_fitness", self.collision_fitness),
        ] {
            if !v.is_finite() {
                return Err(SimError::config(field, format!("{v} is not finite")));
            }
        }
        Ok(())
    }
}
