use std::io::Write;

use macroquad::prelude::*;
use tracing::info;

use crate::config;
use crate::renderer::{self, FieldView, Hud};
use crate::reporting::JsonLinesWriter;
use crate::simulation::{Simulation, Status, StopFlag};
use crate::snapshot::Snapshot;
use crate::stats::TrainingStats;
use crate::trainer::TrainingContext;
use crate::ui::{self, Readout, UiState};

const STATS_CAPACITY: usize = 1000;

/// Training loop driven by the frame clock instead of running flat out.
pub struct Viewer<W: Write> {
    ctx: TrainingContext,
    sim: Simulation,
    snapshot: Snapshot,
    stats: TrainingStats,
    ui_state: UiState,
    field: FieldView,
    report: Option<JsonLinesWriter<W>>,
}

impl<W: Write> Viewer<W> {
    pub fn new(ctx: TrainingContext, report: Option<JsonLinesWriter<W>>) -> anyhow::Result<Self> {
        let sim = ctx.begin_generation()?;
        Ok(Self {
            snapshot: sim.snapshot(),
            field: FieldView::from_config(ctx.sim_config()),
            sim,
            ctx,
            stats: TrainingStats::new(STATS_CAPACITY),
            ui_state: UiState::default(),
            report,
        })
    }

    /// One simulation tick, or the generation handover once the current
    /// evaluation is over. Returns false when training is finished.
    fn tick(&mut self, stop: &StopFlag) -> anyhow::Result<bool> {
        let capped = self
            .ctx
            .trainer_config()
            .max_ticks
            .is_some_and(|max| self.sim.tick() >= max);
        if stop.is_raised() || capped {
            self.sim.stop();
        }

        if self.sim.status() == Status::Running {
            let report = self.sim.step()?;
            self.snapshot = self.sim.snapshot();
            self.stats.record_tick(report.alive);
            return Ok(true);
        }

        let report = self.ctx.finish_generation(&self.sim.summary())?;
        self.stats.record_generation(&report);
        if let Some(writer) = self.report.as_mut() {
            writer.write(&report)?;
        }
        if self.ctx.is_done() || stop.is_raised() {
            return Ok(false);
        }
        self.sim = self.ctx.begin_generation()?;
        self.snapshot = self.sim.snapshot();
        Ok(true)
    }

    pub async fn run(mut self, stop: StopFlag) -> anyhow::Result<()> {
        let mut accumulator = 0.0f64;

        loop {
            if is_key_pressed(KeyCode::Escape) {
                stop.raise();
            }
            if is_key_pressed(KeyCode::Space) {
                self.ui_state.paused = !self.ui_state.paused;
            }

            let effective_dt =
                1.0 / (config::TICKS_PER_SECOND as f64 * self.ui_state.speed_multiplier as f64);
            accumulator += (get_frame_time() as f64).min(0.1);

            if self.ui_state.paused && !stop.is_raised() {
                accumulator = 0.0;
                if self.ui_state.step_requested {
                    self.ui_state.step_requested = false;
                    if !self.tick(&stop)? {
                        break;
                    }
                }
            } else {
                let mut running = true;
                while accumulator >= effective_dt || stop.is_raised() {
                    accumulator = (accumulator - effective_dt).max(0.0);
                    running = self.tick(&stop)?;
                    if !running {
                        break;
                    }
                }
                if !running {
                    break;
                }
            }

            let hud = Hud {
                generation: self.ctx.generation(),
                paused: self.ui_state.paused,
                speed_multiplier: self.ui_state.speed_multiplier,
            };
            renderer::draw(&self.snapshot, &self.field, &hud);

            let readout = Readout {
                generation: self.ctx.generation(),
                score: self.snapshot.score,
                alive: self.snapshot.alive(),
                tick: self.snapshot.tick,
            };
            ui::draw_ui(&mut self.ui_state, &readout, &self.stats);

            next_frame().await;
        }

        match self.ctx.champion() {
            Some((fitness, _)) => info!(
                generations = self.ctx.generation(),
                best = *fitness,
                "viewer closed"
            ),
            None => info!("viewer closed before the first generation finished"),
        }
        Ok(())
    }
}
