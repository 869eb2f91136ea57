//! Service layer: the engine's algorithms and orchestration.

pub mod collector;
pub mod content_hash;
pub mod cycle_detector;
pub mod diagram_builder;
pub mod orchestrator;
pub mod registry;
pub mod run_driver;
pub mod stepper;

pub use collector::{semantic_drift, EmbeddingCollector};
pub use content_hash::output_hash;
pub use cycle_detector::{CycleDetector, StepDecision};
pub use diagram_builder::{persistence_entropy, PersistenceDiagramBuilder};
pub use orchestrator::{ExperimentEvent, ExperimentOrchestrator, ExperimentReport, RunReport};
pub use registry::{EmbedderHandle, GenerativeHandle, ModelRegistry};
pub use run_driver::{RunDriver, RunOutcome, RunStream};
pub use stepper::TrajectoryStepper;
