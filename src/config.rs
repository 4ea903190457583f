// All tunable simulation constants in one place.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::scoring::ScoringPolicy;

// Field
pub const FIELD_WIDTH: f32 = 500.0;
pub const FIELD_HEIGHT: f32 = 700.0;
pub const FLOOR_Y: f32 = 730.0;
pub const START_X: f32 = 130.0;
pub const START_Y: f32 = 250.0;

// Flight
pub const GRAVITY: f32 = 3.0;
pub const JUMP_IMPULSE: f32 = -10.5;
pub const TERMINAL_VELOCITY: f32 = 16.0;
pub const UPWARD_CORRECTION: f32 = 2.0;
pub const JUMP_THRESHOLD: f32 = 0.5;

// Tilt (cosmetic only)
pub const MAX_TILT: f32 = 25.0;
pub const MIN_TILT: f32 = -90.0;
pub const TILT_DECAY: f32 = 20.0;
pub const TILT_HOLD_DROP: f32 = 50.0;

// Obstacles
pub const GAP: f32 = 200.0;
pub const OBSTACLE_VEL: f32 = 5.0;
pub const GAP_RANGE_MIN: i32 = 50;
pub const GAP_RANGE_MAX: i32 = 400;
pub const INITIAL_OBSTACLE_X: f32 = 500.0;
pub const SPAWN_X: f32 = 600.0;

// Shapes (sprite silhouettes, already scaled 2x)
pub const FLYER_WIDTH: u32 = 68;
pub const FLYER_HEIGHT: u32 = 48;
pub const OBSTACLE_WIDTH: u32 = 104;
pub const OBSTACLE_HEIGHT: u32 = 640;

// Scoring
pub const SURVIVAL_REWARD: f64 = 0.1;
pub const PASS_REWARD: f64 = 10.0;
pub const COLLISION_FITNESS: f64 = -1.0;

// Training
pub const POPULATION_SIZE: usize = 50;
pub const GENERATIONS: u32 = 50;
pub const ELITE_FRACTION: f32 = 0.2;
pub const MUTATION_RATE: f32 = 0.2;
pub const MUTATION_SIGMA: f32 = 0.15;
pub const HIDDEN_NEURONS: usize = 4;
pub const FITNESS_THRESHOLD: f64 = 100.0;
pub const MAX_EVALUATION_TICKS: u64 = 20_000;

// Viewer
pub const TICKS_PER_SECOND: f32 = 30.0;

/// How dead members are taken out of the population mid-phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalMode {
    /// Mark during the phase, compact once at its end. Every member is visited.
    #[default]
    IndexSafe,
    /// Remove while walking by position, so the member right after a removal
    /// is skipped for that phase. Kept for fitness-curve parity runs only.
    LegacyInPlace,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub width: f32,
    pub height: f32,
    /// Flyers whose bottom edge reaches this line are out of bounds.
    pub floor_y: f32,
    pub start_x: f32,
    pub start_y: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: FIELD_WIDTH,
            height: FIELD_HEIGHT,
            floor_y: FLOOR_Y,
            start_x: START_X,
            start_y: START_Y,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub gravity: f32,
    pub jump_impulse: f32,
    pub terminal_velocity: f32,
    pub upward_correction: f32,
    pub max_tilt: f32,
    pub min_tilt: f32,
    pub tilt_decay: f32,
    pub tilt_hold_drop: f32,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            jump_impulse: JUMP_IMPULSE,
            terminal_velocity: TERMINAL_VELOCITY,
            upward_correction: UPWARD_CORRECTION,
            max_tilt: MAX_TILT,
            min_tilt: MIN_TILT,
            tilt_decay: TILT_DECAY,
            tilt_hold_drop: TILT_HOLD_DROP,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    pub gap: f32,
    pub velocity: f32,
    /// Gap centers are drawn from `gap_min..gap_max` in whole units.
    pub gap_min: i32,
    pub gap_max: i32,
    pub initial_x: f32,
    pub spawn_x: f32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            gap: GAP,
            velocity: OBSTACLE_VEL,
            gap_min: GAP_RANGE_MIN,
            gap_max: GAP_RANGE_MAX,
            initial_x: INITIAL_OBSTACLE_X,
            spawn_x: SPAWN_X,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    pub flyer_width: u32,
    pub flyer_height: u32,
    pub obstacle_width: u32,
    pub obstacle_height: u32,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            flyer_width: FLYER_WIDTH,
            flyer_height: FLYER_HEIGHT,
            obstacle_width: OBSTACLE_WIDTH,
            obstacle_height: OBSTACLE_HEIGHT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub field: FieldConfig,
    pub flight: FlightConfig,
    pub obstacles: ObstacleConfig,
    pub shapes: ShapeConfig,
    pub scoring: ScoringPolicy,
    /// Oracle outputs strictly above this request an impulse.
    pub jump_threshold: f32,
    pub removal: RemovalMode,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            field: FieldConfig::default(),
            flight: FlightConfig::default(),
            obstacles: ObstacleConfig::default(),
            shapes: ShapeConfig::default(),
            scoring: ScoringPolicy::default(),
            jump_threshold: JUMP_THRESHOLD,
            removal: RemovalMode::default(),
            seed: 42,
        }
    }
}

impl SimConfig {
    /// Reject configurations the simulation cannot run on.
    pub fn validate(&self) -> Result<()> {
        let f = &self.field;
        positive("field.width", f.width)?;
        positive("field.height", f.height)?;
        positive("field.floor_y", f.floor_y)?;
        finite("field.start_x", f.start_x)?;
        finite("field.start_y", f.start_y)?;
        if f.start_y < 0.0 || f.start_y + self.shapes.flyer_height as f32 >= f.floor_y {
            return Err(SimError::config(
                "field.start_y",
                format!("{} puts the flyer out of bounds", f.start_y),
            ));
        }

        let fl = &self.flight;
        non_negative("flight.gravity", fl.gravity)?;
        finite("flight.jump_impulse", fl.jump_impulse)?;
        positive("flight.terminal_velocity", fl.terminal_velocity)?;
        non_negative("flight.upward_correction", fl.upward_correction)?;
        finite("flight.max_tilt", fl.max_tilt)?;
        finite("flight.min_tilt", fl.min_tilt)?;
        non_negative("flight.tilt_decay", fl.tilt_decay)?;
        finite("flight.tilt_hold_drop", fl.tilt_hold_drop)?;
        if fl.min_tilt > fl.max_tilt {
            return Err(SimError::config(
                "flight.min_tilt",
                format!("{} exceeds max_tilt {}", fl.min_tilt, fl.max_tilt),
            ));
        }

        let o = &self.obstacles;
        positive("obstacles.gap", o.gap)?;
        positive("obstacles.velocity", o.velocity)?;
        finite("obstacles.initial_x", o.initial_x)?;
        finite("obstacles.spawn_x", o.spawn_x)?;
        if o.spawn_x <= f.start_x {
            return Err(SimError::config(
                "obstacles.spawn_x",
                format!("{} must be ahead of the flyers at x={}", o.spawn_x, f.start_x),
            ));
        }
        if o.gap_min >= o.gap_max {
            return Err(SimError::config(
                "obstacles.gap_min",
                format!("empty gap range {}..{}", o.gap_min, o.gap_max),
            ));
        }

        let s = &self.shapes;
        for (field, v) in [
            ("shapes.flyer_width", s.flyer_width),
            ("shapes.flyer_height", s.flyer_height),
            ("shapes.obstacle_width", s.obstacle_width),
            ("shapes.obstacle_height", s.obstacle_height),
        ] {
            if v == 0 {
                return Err(SimError::config(field, "must be at least one unit"));
            }
        }

        finite("jump_threshold", self.jump_threshold)?;
        self.scoring.validate()
    }
}

/// Knobs for the evolutionary loop around the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub population_size: usize,
    pub generations: u32,
    /// Share of each generation carried over unchanged.
    pub elite_fraction: f32,
    pub mutation_rate: f32,
    pub mutation_sigma: f32,
    pub hidden_neurons: usize,
    /// Stop once a generation's best fitness reaches this.
    pub fitness_threshold: Option<f64>,
    /// Per-evaluation tick cap. Good flyers can otherwise run forever.
    pub max_ticks: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            population_size: POPULATION_SIZE,
            generations: GENERATIONS,
            elite_fraction: ELITE_FRACTION,
            mutation_rate: MUTATION_RATE,
            mutation_sigma: MUTATION_SIGMA,
            hidden_neurons: HIDDEN_NEURONS,
            fitness_threshold: Some(FITNESS_THRESHOLD),
            max_ticks: Some(MAX_EVALUATION_TICKS),
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(SimError::config("trainer.population_size", "must be at least 1"));
        }
        if self.generations == 0 {
            return Err(SimError::config("trainer.generations", "must be at least 1"));
        }
        positive("trainer.elite_fraction", self.elite_fraction)?;
        if self.elite_fraction > 1.0 {
            return Err(SimError::config(
                "trainer.elite_fraction",
                format!("{} exceeds 1", self.elite_fraction),
            ));
        }
        non_negative("trainer.mutation_rate", self.mutation_rate)?;
        if self.mutation_rate > 1.0 {
            return Err(SimError::config(
                "trainer.mutation_rate",
                format!("{} exceeds 1", self.mutation_rate),
            ));
        }
        positive("trainer.mutation_sigma", self.mutation_sigma)?;
        if let Some(t) = self.fitness_threshold {
            if !t.is_finite() {
                return Err(SimError::config("trainer.fitness_threshold", "must be finite"));
            }
        }
        if self.max_ticks == Some(0) {
            return Err(SimError::config("trainer.max_ticks", "must be at least 1"));
        }
        Ok(())
    }

    /// Genomes carried into the next generation unchanged. Always at least one.
    pub fn elite_count(&self) -> usize {
        ((self.population_size as f32 * self.elite_fraction).round() as usize)
            .clamp(1, self.population_size)
    }
}

pub(crate) fn finite(field: &'static str, v: f32) -> Result<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(SimError::config(field, format!("{v} is not finite")))
    }
}

pub(crate) fn positive(field: &'static str, v: f32) -> Result<()> {
    finite(field, v)?;
    if v > 0.0 {
        Ok(())
    } else {
        Err(SimError::config(field, format!("{v} must be positive")))
    }
}

pub(crate) fn non_negative(field: &'static str, v: f32) -> Result<()> {
    finite(field, v)?;
    if v >= 0.0 {
        Ok(())
    } else {
        Err(SimError::config(field, format!("{v} must not be negative")))
    }
}
