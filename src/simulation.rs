use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::config::{ShapeConfig, SimConfig};
use crate::error::{Result, SimError};
use crate::flyer::{AgentId, Flyer};
use crate::mask::{self, Mask};
use crate::obstacle::{Obstacle, ObstacleField};
use crate::oracle::{self, DecisionOracle};
use crate::physics;
use crate::population::{Fate, FitnessRecord, Population};
use crate::scoring::FitnessEvent;
use crate::sensory;
use crate::snapshot::{FlyerView, ObstacleView, Snapshot};

/// Lifecycle of one evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Running,
    /// Every member was removed.
    Extinct,
    /// Stopped from outside between ticks.
    Stopped,
    /// A tick aborted with an error.
    Failed,
}

/// Cooperative stop request, checked between ticks only.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Occupancy silhouettes for flyers and obstacle halves.
#[derive(Clone, Debug)]
pub struct Shapes {
    pub flyer: Mask,
    pub obstacle_top: Mask,
    pub obstacle_bottom: Mask,
}

impl Shapes {
    /// Oval flyer, solid rectangular obstacles.
    pub fn from_config(shapes: &ShapeConfig) -> Self {
        let bottom = Mask::filled(shapes.obstacle_width, shapes.obstacle_height);
        Self {
            flyer: Mask::ellipse(shapes.flyer_width, shapes.flyer_height),
            obstacle_top: bottom.flipped_vertical(),
            obstacle_bottom: bottom,
        }
    }

    fn collides(&self, flyer: &Flyer, obstacle: &Obstacle) -> bool {
        let origin = (flyer.x, flyer.y);
        mask::overlaps(&self.flyer, origin, &self.obstacle_top, (obstacle.x, obstacle.top))
            || mask::overlaps(
                &self.flyer,
                origin,
                &self.obstacle_bottom,
                (obstacle.x, obstacle.bottom),
            )
    }
}

/// What happened during one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub passed: bool,
    pub collided: Vec<AgentId>,
    pub out_of_bounds: Vec<AgentId>,
    pub retired: usize,
    pub alive: usize,
}

/// Final state of an evaluation, handed to the fitness consumer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub status: Status,
    pub ticks: u64,
    pub score: u32,
    /// One record per member, ordered by id.
    pub records: Vec<FitnessRecord>,
}

/// Drives a population of flyers through a shared obstacle field.
pub struct Simulation {
    config: SimConfig,
    shapes: Shapes,
    population: Population,
    obstacles: ObstacleField,
    score: u32,
    tick: u64,
    status: Status,
}

impl Simulation {
    /// One flyer per oracle, all at the configured start position.
    pub fn new<I>(config: SimConfig, oracles: I) -> Result<Self>
    where
        I: IntoIterator<Item = Box<dyn DecisionOracle>>,
    {
        let shapes = Shapes::from_config(&config.shapes);
        Self::with_shapes(config, shapes, oracles)
    }

    /// Like [`Simulation::new`] with custom silhouettes. Shape sizes in the
    /// config are taken from the masks.
    pub fn with_shapes<I>(mut config: SimConfig, shapes: Shapes, oracles: I) -> Result<Self>
    where
        I: IntoIterator<Item = Box<dyn DecisionOracle>>,
    {
        if shapes.obstacle_top.width() != shapes.obstacle_bottom.width()
            || shapes.obstacle_top.height() != shapes.obstacle_bottom.height()
        {
            return Err(SimError::config(
                "shapes.obstacle_height",
                "top and bottom obstacle masks differ in size",
            ));
        }
        config.shapes = ShapeConfig {
            flyer_width: shapes.flyer.width(),
            flyer_height: shapes.flyer.height(),
            obstacle_width: shapes.obstacle_bottom.width(),
            obstacle_height: shapes.obstacle_bottom.height(),
        };
        config.validate()?;
        if shapes.flyer.count() == 0 {
            return Err(SimError::config("shapes.flyer_width", "flyer mask has no occupied cells"));
        }

        let mut population = Population::new(config.removal);
        for oracle in oracles {
            population.enroll(Flyer::new(config.field.start_x, config.field.start_y), oracle);
        }
        if population.is_empty() {
            return Err(SimError::config("population", "at least one flyer is required"));
        }

        let obstacles = ObstacleField::new(&config.obstacles, &config.shapes, config.seed);
        Ok(Self {
            config,
            shapes,
            population,
            obstacles,
            score: 0,
            tick: 0,
            status: Status::Running,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    pub fn fitness(&self, id: AgentId) -> Option<f64> {
        self.population.fitness(id)
    }

    /// Advance one tick. Does nothing once the evaluation is over.
    pub fn step(&mut self) -> Result<TickReport> {
        if self.status != Status::Running {
            return Ok(TickReport {
                tick: self.tick,
                alive: self.population.len(),
                ..TickReport::default()
            });
        }
        let result = self.advance_tick();
        if let Err(err) = &result {
            warn!(tick = self.tick, %err, "evaluation aborted");
            self.status = Status::Failed;
        }
        result
    }

    fn advance_tick(&mut self) -> Result<TickReport> {
        self.tick += 1;
        let tick = self.tick;
        let mut report = TickReport {
            tick,
            ..TickReport::default()
        };

        let lead_x = match self.population.lead() {
            Some(lead) => lead.flyer.x,
            None => return Err(SimError::Invariant("tick on an empty population".into())),
        };
        let target = sensory::target_obstacle(&self.obstacles, lead_x);
        let target = self
            .obstacles
            .get(target)
            .cloned()
            .ok_or_else(|| SimError::Invariant(format!("no obstacle at index {target}")))?;

        let flight = &self.config.flight;
        let scoring = &self.config.scoring;
        let threshold = self.config.jump_threshold;

        // Decide
        for member in self.population.iter_mut() {
            physics::advance(&mut member.flyer, flight);
            member.fitness = scoring.apply(FitnessEvent::Survived, member.fitness);

            let inputs = sensory::flyer_inputs(&member.flyer, &target);
            let output = member.oracle.decide(&inputs).map_err(|e| SimError::Oracle {
                agent: member.id,
                reason: e.0,
            })?;
            let jump = oracle::wants_jump(&output, threshold).map_err(|reason| {
                SimError::Oracle {
                    agent: member.id,
                    reason,
                }
            })?;
            if jump {
                physics::jump(&mut member.flyer, flight);
            }
        }

        // Collide and pass
        let shapes = &self.shapes;
        for index in 0..self.obstacles.len() {
            let Some(obstacle) = self.obstacles.get(index).cloned() else {
                break;
            };
            let mut passed_now = false;
            let removed = self.population.sweep(tick, |member| {
                let mut fate = None;
                if shapes.collides(&member.flyer, &obstacle) {
                    member.fitness = scoring.apply(FitnessEvent::Collided, member.fitness);
                    fate = Some(Fate::Collided);
                }
                if !obstacle.passed && obstacle.x < member.flyer.x {
                    passed_now = true;
                }
                fate
            });
            if passed_now && self.obstacles.mark_passed(index) {
                report.passed = true;
            }
            report.collided.extend(removed);
        }

        // Scroll, retire, reward
        self.obstacles.advance();
        report.retired = self.obstacles.retire();
        if report.passed {
            self.score += 1;
            for member in self.population.iter_mut() {
                member.fitness = scoring.apply(FitnessEvent::ObstaclePassed, member.fitness);
            }
            self.obstacles.spawn_ahead();
            debug!(tick, score = self.score, alive = self.population.len(), "obstacle cleared");
        }

        // Bounds
        let floor = self.config.field.floor_y;
        let height = self.shapes.flyer.height();
        report.out_of_bounds = self.population.sweep(tick, |member| {
            let out = member.flyer.bottom(height) >= floor || member.flyer.y < 0.0;
            if !out {
                return None;
            }
            member.fitness = scoring.apply(FitnessEvent::OutOfBounds, member.fitness);
            Some(Fate::OutOfBounds)
        });

        report.alive = self.population.len();
        if self.population.is_empty() {
            self.status = Status::Extinct;
            info!(tick, score = self.score, "population extinct");
        }

        self.obstacles.check()?;
        self.population.check()?;

        trace!(
            tick,
            alive = report.alive,
            collided = report.collided.len(),
            out_of_bounds = report.out_of_bounds.len(),
            "tick complete"
        );
        Ok(report)
    }

    /// End the evaluation from outside. Live members are finalized as survivors.
    pub fn stop(&mut self) {
        if self.status == Status::Running {
            warn!(tick = self.tick, alive = self.population.len(), "evaluation stopped");
            self.population.finish_all(Fate::Survived, self.tick);
            self.status = Status::Stopped;
        }
    }

    /// Step until extinction, `stop` is raised, or `max_ticks` is reached.
    /// `observer` sees a snapshot after every completed tick.
    pub fn run<F>(
        &mut self,
        stop: &StopFlag,
        max_ticks: Option<u64>,
        mut observer: F,
    ) -> Result<EvaluationSummary>
    where
        F: FnMut(&Snapshot),
    {
        while self.status == Status::Running {
            if stop.is_raised() || max_ticks.is_some_and(|max| self.tick >= max) {
                self.stop();
                break;
            }
            self.step()?;
            observer(&self.snapshot());
        }
        Ok(self.summary())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            score: self.score,
            flyers: self
                .population
                .iter()
                .map(|m| FlyerView {
                    id: m.id,
                    x: m.flyer.x,
                    y: m.flyer.y,
                    tilt: m.flyer.tilt,
                })
                .collect(),
            obstacles: self
                .obstacles
                .iter()
                .map(|o| ObstacleView {
                    x: o.x,
                    gap_center: o.gap_center,
                    top: o.top,
                    bottom: o.bottom,
                    passed: o.passed,
                })
                .collect(),
        }
    }

    /// Records of every member removed so far, ordered by id.
    pub fn summary(&self) -> EvaluationSummary {
        let mut records = self.population.finished().to_vec();
        records.sort_by_key(|r| r.id);
        EvaluationSummary {
            status: self.status,
            ticks: self.tick,
            score: self.score,
            records,
        }
    }

    #[cfg(test)]
    pub(crate) fn obstacles_mut(&mut self) -> &mut ObstacleField {
        &mut self.obstacles
    }
}
