//! Trajectory tracer CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trajectory_tracer::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::RunExperiment(args) => cli::commands::experiment::execute(args).await,
        Commands::ListModels => cli::commands::models::execute().await,
        Commands::ValidateConfig(args) => cli::commands::validate::execute(args).await,
    };

    if let Err(err) = result {
        cli::handle_error(err);
    }
}
