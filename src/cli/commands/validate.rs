//! `validate-config` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::adapters::models::default_registry;
use crate::infrastructure::ConfigLoader;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the experiment definition (JSON or YAML)
    pub config_file: PathBuf,
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let experiment = ConfigLoader::load_experiment(&args.config_file)?;

    let registry = default_registry(&config);
    registry
        .validate_experiment(&experiment)
        .context("experiment references unknown models; see `list-models`")?;

    println!(
        "OK: {} runs over {} network(s), {} embedding model(s), run length {}",
        experiment.run_count(),
        experiment.networks.len(),
        experiment.embedding_models.len(),
        experiment.run_length,
    );
    Ok(())
}
