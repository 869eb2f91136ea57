//! Trajectory Tracer - Generative Chain Trajectory Engine
//!
//! Trajectory Tracer studies how chains of generative models behave when fed
//! each other's outputs repeatedly: an initial prompt is transformed by a
//! cyclic sequence of models (text -> image -> text -> ...), and the
//! resulting trajectory is analyzed for convergence, looping, and
//! topological structure in embedding space.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, ports, and errors
//! - **Service Layer** (`services`): the engine — stepping, cycle detection,
//!   orchestration, trajectory collection, diagram building
//! - **Adapters** (`adapters`): built-in models and the homology backend
//! - **Infrastructure Layer** (`infrastructure`): configuration and export
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use trajectory_tracer::adapters::homology::VietorisRips;
//! use trajectory_tracer::adapters::models::default_registry;
//! use trajectory_tracer::domain::models::EngineConfig;
//! use trajectory_tracer::services::ExperimentOrchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EngineConfig::default();
//!     let registry = Arc::new(default_registry(&config));
//!     let orchestrator =
//!         ExperimentOrchestrator::new(registry, Arc::new(VietorisRips), config);
//!     // orchestrator.run_experiment(&experiment).await?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{EngineError, EngineResult};
pub use domain::models::{
    Embedding, EngineConfig, ExperimentConfig, Generator, Invocation, ModelOutput, Network,
    OutputModality, PersistenceDiagram, Run, RunState, StopReason,
};
pub use domain::ports::{GenerativeModel, HomologyBackend, TextEmbedder};
pub use infrastructure::{ConfigLoader, ExperimentExporter};
pub use services::{
    CycleDetector, EmbeddingCollector, ExperimentOrchestrator, ExperimentReport, ModelRegistry,
    PersistenceDiagramBuilder, RunDriver, RunReport, TrajectoryStepper,
};
