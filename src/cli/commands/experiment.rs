//! `run-experiment` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::mpsc;

use crate::adapters::homology::VietorisRips;
use crate::adapters::models::default_registry;
use crate::cli::output::{create_progress_bar, create_spinner};
use crate::domain::models::RunState;
use crate::infrastructure::{ConfigLoader, ExperimentExporter};
use crate::services::orchestrator::{ExperimentEvent, ExperimentOrchestrator};

#[derive(Args, Debug)]
pub struct ExperimentArgs {
    /// Path to the experiment definition (JSON or YAML)
    pub config_file: PathBuf,

    /// Directory results are exported under
    #[arg(long, short)]
    pub output_dir: Option<PathBuf>,

    /// Override the configured run concurrency limit
    #[arg(long)]
    pub max_concurrent_runs: Option<usize>,
}

pub async fn execute(args: ExperimentArgs) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(limit) = args.max_concurrent_runs {
        config.max_concurrent_runs = limit.max(1);
    }

    let experiment = ConfigLoader::load_experiment(&args.config_file)?;
    let registry = Arc::new(default_registry(&config));
    registry
        .validate_experiment(&experiment)
        .context("experiment references unknown models; see `list-models`")?;

    let run_count = experiment.run_count();
    println!(
        "Running experiment: {} runs ({} networks x {} seeds x {} prompts), length {}",
        run_count,
        experiment.networks.len(),
        experiment.seeds.len(),
        experiment.prompts.len(),
        experiment.run_length,
    );

    let (event_tx, mut event_rx) = mpsc::channel(256);
    let orchestrator = ExperimentOrchestrator::new(registry, Arc::new(VietorisRips), config.clone())
        .with_events(event_tx);

    let experiment_task =
        tokio::spawn(async move { orchestrator.run_experiment(&experiment).await });

    let progress = create_progress_bar(run_count as u64);
    while let Some(event) = event_rx.recv().await {
        match event {
            ExperimentEvent::InvocationCompleted {
                run_id,
                sequence_number,
            } => {
                progress.set_message(format!("run {run_id} @ step {sequence_number}"));
            }
            ExperimentEvent::RunFinished { run_id, state } => {
                progress.inc(1);
                if state == RunState::Failed {
                    progress.println(format!("run {run_id} failed"));
                }
            }
            ExperimentEvent::RunStarted { .. } | ExperimentEvent::DiagramCompleted { .. } => {}
        }
    }

    let report = experiment_task
        .await
        .context("experiment task panicked")??;
    progress.finish_with_message("all runs finished");

    let spinner = create_spinner("exporting results");
    ExperimentExporter::new(&config.output_dir).export(&report)?;
    spinner.finish_with_message("results exported");

    println!(
        "Experiment finished: {} completed, {} failed. Results in {}",
        report.completed_runs(),
        report.failed_runs(),
        config.output_dir.display(),
    );
    Ok(())
}
