//! Command-line interface.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use commands::experiment::ExperimentArgs;
use commands::validate::ValidateArgs;

/// Trajectory tracer: run chained generative-model experiments and
/// summarize their embedding trajectories topologically.
#[derive(Parser, Debug)]
#[command(name = "trajectory-tracer", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the experiment defined in a config file
    RunExperiment(ExperimentArgs),
    /// List available generative and embedding models
    ListModels,
    /// Check an experiment config against the model registry
    ValidateConfig(ValidateArgs),
}

/// Report a fatal CLI error and exit nonzero.
pub fn handle_error(err: anyhow::Error) -> ! {
    tracing::error!(error = ?err, "command failed");
    eprintln!("Error: {err:#}");
    std::process::exit(1);
}
