use std::collections::VecDeque;

use ::rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{ObstacleConfig, ShapeConfig};
use crate::error::{Result, SimError};

/// One top/bottom obstacle pair.
#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    pub x: f32,
    /// Upper bound of the gap. Fixed for the obstacle's lifetime.
    pub gap_center: f32,
    /// Where the top shape is drawn: `gap_center - shape height`.
    pub top: f32,
    /// Where the bottom shape starts: `gap_center + gap`.
    pub bottom: f32,
    pub passed: bool,
}

/// Live obstacles ordered by creation, oldest (leftmost) first.
pub struct ObstacleField {
    obstacles: VecDeque<Obstacle>,
    params: ObstacleConfig,
    width: u32,
    height: u32,
    rng: ChaCha8Rng,
}

impl ObstacleField {
    /// Field with the initial obstacle already spawned.
    pub fn new(params: &ObstacleConfig, shapes: &ShapeConfig, seed: u64) -> Self {
        let mut field = Self::empty(params, shapes, seed);
        field.spawn(params.initial_x);
        field
    }

    pub fn empty(params: &ObstacleConfig, shapes: &ShapeConfig, seed: u64) -> Self {
        Self {
            obstacles: VecDeque::with_capacity(4),
            params: params.clone(),
            width: shapes.obstacle_width,
            height: shapes.obstacle_height,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Append a new obstacle at `x` with a freshly drawn gap.
    pub fn spawn(&mut self, x: f32) -> &Obstacle {
        let gap_center = self.rng.gen_range(self.params.gap_min..self.params.gap_max) as f32;
        self.obstacles.push_back(Obstacle {
            x,
            gap_center,
            top: gap_center - self.height as f32,
            bottom: gap_center + self.params.gap,
            passed: false,
        });
        &self.obstacles[self.obstacles.len() - 1]
    }

    /// Spawn at the configured distance ahead of the field.
    pub fn spawn_ahead(&mut self) -> &Obstacle {
        let x = self.params.spawn_x;
        self.spawn(x)
    }

    /// Scroll every obstacle left by one tick.
    pub fn advance(&mut self) {
        for obstacle in self.obstacles.iter_mut() {
            obstacle.x -= self.params.velocity;
        }
    }

    /// Whether an obstacle has fully left the field on the left.
    pub fn is_retired(&self, obstacle: &Obstacle) -> bool {
        obstacle.x + (self.width as f32) < 0.0
    }

    /// Drop obstacles that left the field. Returns how many were dropped.
    pub fn retire(&mut self) -> usize {
        let mut retired = 0;
        while let Some(front) = self.obstacles.front() {
            if !self.is_retired(front) {
                break;
            }
            self.obstacles.pop_front();
            retired += 1;
        }
        retired
    }

    pub fn mark_passed(&mut self, index: usize) -> bool {
        match self.obstacles.get_mut(index) {
            Some(o) if !o.passed => {
                o.passed = true;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&Obstacle> {
        self.obstacles.get(index)
    }

    pub fn front(&self) -> Option<&Obstacle> {
        self.obstacles.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> + '_ {
        self.obstacles.iter()
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Gap geometry within range and creation order preserved.
    pub fn check(&self) -> Result<()> {
        let (lo, hi) = (self.params.gap_min as f32, self.params.gap_max as f32);
        for (i, o) in self.obstacles.iter().enumerate() {
            if !(lo..hi).contains(&o.gap_center) {
                return Err(SimError::Invariant(format!(
                    "obstacle {i} gap center {} outside {lo}..{hi}",
                    o.gap_center
                )));
            }
            if o.bottom - o.top != self.params.gap + self.height as f32 {
                return Err(SimError::Invariant(format!(
                    "obstacle {i} edges {}..{} do not match the configured gap",
                    o.top, o.bottom
                )));
            }
        }
        let successors = self.obstacles.iter().skip(1);
        for (i, (a, b)) in self.obstacles.iter().zip(successors).enumerate() {
            if a.x >= b.x {
                return Err(SimError::Invariant(format!(
                    "obstacle {i} at x={} is not left of its successor at x={}",
                    a.x, b.x
                )));
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn push_raw(&mut self, obstacle: Obstacle) {
        self.obstacles.push_back(obstacle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn field(seed: u64) -> ObstacleField {
        ObstacleField::new(&ObstacleConfig::default(), &ShapeConfig::default(), seed)
    }

    #[test]
    fn starts_with_one_obstacle_ahead() {
        let f = field(1);
        assert_eq!(f.len(), 1);
        let o = f.front().unwrap();
        assert_eq!(o.x, 500.0);
        assert!(!o.passed);
    }

    #[test]
    fn advance_moves_every_obstacle_left_by_velocity() {
        let mut f = field(2);
        f.spawn_ahead();
        f.advance();
        let xs: Vec<f32> = f.iter().map(|o| o.x).collect();
        assert_eq!(xs, vec![495.0, 595.0]);
    }

    #[test]
    fn retire_drops_only_fully_offscreen_obstacles() {
        let mut f = ObstacleField::empty(&ObstacleConfig::default(), &ShapeConfig::default(), 3);
        f.spawn(-104.0);
        f.spawn(-50.0);
        f.spawn(300.0);
        assert_eq!(f.retire(), 0);
        f.advance();
        assert_eq!(f.retire(), 1);
        let xs: Vec<f32> = f.iter().map(|o| o.x).collect();
        assert_eq!(xs, vec![-55.0, 295.0]);
    }

    #[test]
    fn passed_flips_once() {
        let mut f = field(4);
        assert!(f.mark_passed(0));
        assert!(!f.mark_passed(0));
        assert!(!f.mark_passed(5));
    }

    #[test]
    fn same_seed_same_gaps() {
        let mut a = field(9);
        let mut b = field(9);
        for _ in 0..20 {
            assert_eq!(a.spawn_ahead().gap_center, b.spawn_ahead().gap_center);
        }
    }

    #[test]
    fn check_flags_bad_geometry_and_order() {
        let mut f = field(5);
        assert!(f.check().is_ok());
        f.push_raw(Obstacle {
            x: 100.0,
            gap_center: 120.0,
            top: 120.0 - 640.0,
            bottom: 320.0,
            passed: false,
        });
        assert!(matches!(f.check(), Err(SimError::Invariant(_))));

        let mut g = field(5);
        g.push_raw(Obstacle {
            x: 900.0,
            gap_center: 450.0,
            top: 450.0 - 640.0,
            bottom: 650.0,
            passed: false,
        });
        assert!(matches!(g.check(), Err(SimError::Invariant(_))));
    }

    proptest! {
        #[test]
        fn spawned_gaps_stay_in_range(seed in any::<u64>(), spawns in 1usize..50) {
            let mut f = field(seed);
            for _ in 0..spawns {
                let o = f.spawn_ahead().clone();
                prop_assert!((50.0..400.0).contains(&o.gap_center));
                prop_assert_eq!(o.gap_center.fract(), 0.0);
                prop_assert_eq!(o.bottom - o.top, 200.0 + 640.0);
            }
        }
    }
}
