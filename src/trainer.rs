use ::rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::brain::FeedForwardBrain;
use crate::config::{SimConfig, TrainerConfig};
use crate::error::{Result, SimError};
use crate::genome::Genome;
use crate::oracle::DecisionOracle;
use crate::reporting::GenerationReport;
use crate::simulation::{EvaluationSummary, Simulation, StopFlag};
use crate::snapshot::Snapshot;

/// Evolutionary loop state: one genome per flyer, bred between evaluations.
pub struct TrainingContext {
    generation: u32,
    rng: ChaCha8Rng,
    genomes: Vec<Genome>,
    sim_config: SimConfig,
    trainer: TrainerConfig,
    /// Best fitness and genome seen in any generation.
    champion: Option<(f64, Genome)>,
    threshold_reached: bool,
}

impl TrainingContext {
    pub fn new(sim_config: SimConfig, trainer: TrainerConfig) -> Result<Self> {
        sim_config.validate()?;
        trainer.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(sim_config.seed);
        let genomes = (0..trainer.population_size)
            .map(|_| Genome::random(&mut rng, trainer.hidden_neurons))
            .collect();
        Ok(Self {
            generation: 0,
            rng,
            genomes,
            sim_config,
            trainer,
            champion: None,
            threshold_reached: false,
        })
    }

    /// Completed evaluations so far.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    pub fn sim_config(&self) -> &SimConfig {
        &self.sim_config
    }

    pub fn trainer_config(&self) -> &TrainerConfig {
        &self.trainer
    }

    pub fn champion(&self) -> Option<&(f64, Genome)> {
        self.champion.as_ref()
    }

    /// Generation budget spent or fitness threshold reached.
    pub fn is_done(&self) -> bool {
        self.threshold_reached || self.generation >= self.trainer.generations
    }

    /// Build the evaluation for the current pool. Obstacle gaps are reseeded
    /// per generation so flyers don't overfit one course.
    pub fn begin_generation(&self) -> Result<Simulation> {
        let mut config = self.sim_config.clone();
        config.seed = self.sim_config.seed.wrapping_add(u64::from(self.generation));

        let mut oracles: Vec<Box<dyn DecisionOracle>> = Vec::with_capacity(self.genomes.len());
        for (i, genome) in self.genomes.iter().enumerate() {
            let brain = FeedForwardBrain::from_genome(genome)
                .map_err(|e| SimError::Invariant(format!("genome {i}: {e}")))?;
            oracles.push(Box::new(brain));
        }
        Simulation::new(config, oracles)
    }

    /// Consume a finished evaluation: summarise it, then breed the next pool.
    pub fn finish_generation(&mut self, summary: &EvaluationSummary) -> Result<GenerationReport> {
        if summary.records.len() != self.genomes.len() {
            return Err(SimError::Invariant(format!(
                "{} fitness records for {} genomes",
                summary.records.len(),
                self.genomes.len()
            )));
        }
        // Member ids are assigned in genome order.
        let fitness: Vec<f64> = summary.records.iter().map(|r| r.fitness).collect();

        let report = GenerationReport::from_summary(self.generation, summary);
        info!(
            generation = report.generation,
            best = report.best(),
            mean = report.fitness.mean,
            score = report.score,
            ticks = report.ticks,
            "generation complete"
        );

        self.breed(&fitness);
        if let Some(threshold) = self.trainer.fitness_threshold {
            if report.best() >= threshold {
                info!(generation = report.generation, threshold, "fitness threshold reached");
                self.threshold_reached = true;
            }
        }
        self.generation += 1;
        Ok(report)
    }

    /// One full evaluation of the current pool.
    pub fn run_generation<F>(&mut self, stop: &StopFlag, observer: F) -> Result<GenerationReport>
    where
        F: FnMut(&Snapshot),
    {
        let mut sim = self.begin_generation()?;
        let summary = sim.run(stop, self.trainer.max_ticks, observer)?;
        self.finish_generation(&summary)
    }

    /// Evaluate generations until done or stopped.
    pub fn train<F>(&mut self, stop: &StopFlag, mut observer: F) -> Result<Vec<GenerationReport>>
    where
        F: FnMut(&Snapshot),
    {
        let mut reports = Vec::new();
        while !self.is_done() && !stop.is_raised() {
            reports.push(self.run_generation(stop, &mut observer)?);
        }
        Ok(reports)
    }

    /// Elitism + mutation. Elites keep their slot order by rank.
    fn breed(&mut self, fitness: &[f64]) {
        let mut ranked: Vec<usize> = (0..self.genomes.len()).collect();
        ranked.sort_by(|a, b| fitness[*b].total_cmp(&fitness[*a]));

        if let Some(&best) = ranked.first() {
            let improved = self
                .champion
                .as_ref()
                .map_or(true, |(f, _)| fitness[best] > *f);
            if improved {
                self.champion = Some((fitness[best], self.genomes[best].clone()));
            }
        }

        let elite_count = self.trainer.elite_count();
        let mut next: Vec<Genome> = ranked[..elite_count]
            .iter()
            .map(|&i| self.genomes[i].clone())
            .collect();
        while next.len() < self.trainer.population_size {
            let parent = &next[self.rng.gen_range(0..elite_count)];
            let child = parent.mutate(
                &mut self.rng,
                self.trainer.mutation_rate,
                self.trainer.mutation_sigma,
            );
            next.push(child);
        }
        debug!(elites = elite_count, pool = next.len(), "bred next generation");
        self.genomes = next;
    }
}
