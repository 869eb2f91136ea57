//! Domain models for the trajectory engine.

pub mod config;
pub mod diagram;
pub mod embedding;
pub mod experiment;
pub mod invocation;
pub mod network;
pub mod run;

pub use config::EngineConfig;
pub use diagram::{DiagramDimension, Generator, PersistenceDiagram};
pub use embedding::Embedding;
pub use experiment::ExperimentConfig;
pub use invocation::{Invocation, ModelOutput, OutputModality};
pub use network::Network;
pub use run::{Run, RunState, StopReason};
