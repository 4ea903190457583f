use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use macroquad::prelude::Conf;
use serde::de::DeserializeOwned;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use updraft::reporting::JsonLinesWriter;
use updraft::viewer::Viewer;
use updraft::{SimConfig, StopFlag, TrainerConfig, TrainingContext};

type ReportWriter = JsonLinesWriter<BufWriter<File>>;

/// Evolve flyers through an endless obstacle course.
#[derive(Parser, Debug)]
#[command(name = "updraft", version, about)]
struct Args {
    /// Train without opening a window.
    #[arg(long)]
    headless: bool,

    /// Generation budget.
    #[arg(long)]
    generations: Option<u32>,

    /// Flyers per generation.
    #[arg(long)]
    population: Option<usize>,

    /// Seed for obstacle gaps and genome initialisation.
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation config (JSON). Missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trainer config (JSON). Missing fields keep their defaults.
    #[arg(long)]
    trainer_config: Option<PathBuf>,

    /// Write one JSON line per generation here.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Cap on ticks per evaluation.
    #[arg(long)]
    max_ticks: Option<u64>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut sim_config: SimConfig = load_or_default(args.config.as_deref())?;
    let mut trainer_config: TrainerConfig = load_or_default(args.trainer_config.as_deref())?;
    if let Some(seed) = args.seed {
        sim_config.seed = seed;
    }
    if let Some(generations) = args.generations {
        trainer_config.generations = generations;
    }
    if let Some(population) = args.population {
        trainer_config.population_size = population;
    }
    if args.max_ticks.is_some() {
        trainer_config.max_ticks = args.max_ticks;
    }

    let ctx = TrainingContext::new(sim_config, trainer_config)
        .context("invalid configuration")?;
    let report = match &args.report {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating report {}", path.display()))?;
            Some(JsonLinesWriter::new(BufWriter::new(file)))
        }
        None => None,
    };

    info!(
        seed = ctx.sim_config().seed,
        population = ctx.trainer_config().population_size,
        generations = ctx.trainer_config().generations,
        headless = args.headless,
        "starting training"
    );

    if args.headless {
        run_headless(ctx, report)
    } else {
        let viewer = Viewer::new(ctx, report)?;
        macroquad::Window::from_config(window_conf(), async move {
            if let Err(err) = viewer.run(StopFlag::new()).await {
                error!("viewer failed: {err:#}");
            }
        });
        Ok(())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "updraft=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Updraft".to_string(),
        window_width: 960,
        window_height: 900,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

fn load_or_default<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn run_headless(mut ctx: TrainingContext, mut report: Option<ReportWriter>) -> Result<()> {
    let stop = StopFlag::new();
    while !ctx.is_done() {
        let generation = ctx.run_generation(&stop, |_| {})?;
        if let Some(writer) = report.as_mut() {
            writer.write(&generation)?;
        }
    }
    if let Some((fitness, _)) = ctx.champion() {
        info!(generations = ctx.generation(), best = *fitness, "training finished");
    }
    Ok(())
}
