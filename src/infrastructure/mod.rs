//! Infrastructure layer: configuration and result export.

pub mod config;
pub mod export;

pub use config::{ConfigError, ConfigLoader};
pub use export::ExperimentExporter;
