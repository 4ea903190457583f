//! Deterministic flappy-flyer simulation for evolving decision oracles.

pub mod brain;
pub mod config;
pub mod error;
pub mod flyer;
pub mod genome;
pub mod mask;
pub mod obstacle;
pub mod oracle;
pub mod physics;
pub mod population;
pub mod renderer;
pub mod reporting;
pub mod scoring;
pub mod sensory;
pub mod simulation;
pub mod snapshot;
pub mod stats;
pub mod trainer;
pub mod ui;
pub mod viewer;

pub use config::{SimConfig, TrainerConfig};
pub use error::{Result, SimError};
pub use oracle::DecisionOracle;
pub use simulation::{Simulation, StopFlag};
pub use trainer::TrainingContext;
