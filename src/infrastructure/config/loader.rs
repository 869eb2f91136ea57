//! Configuration loading.
//!
//! Engine settings merge hierarchically: programmatic defaults, then
//! `.tracer/config.yaml`, then `.tracer/local.yaml`, then `TRACER_*`
//! environment variables (highest priority). Experiment definitions load
//! from a standalone JSON or YAML file named on the command line.

use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Json, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::{EngineConfig, ExperimentConfig};

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_concurrent_runs: {0}. Must be at least 1")]
    InvalidMaxConcurrentRuns(usize),

    #[error("Invalid default_model_capacity: {0}. Must be at least 1")]
    InvalidDefaultCapacity(usize),

    #[error("Invalid capacity for model {0}: {1}. Must be at least 1")]
    InvalidModelCapacity(String, usize),

    #[error("Invalid step_timeout_secs: 0. Omit the key to disable the timeout")]
    ZeroStepTimeout,

    #[error("Unsupported experiment file extension: {0}. Use .json, .yaml, or .yml")]
    UnsupportedExtension(String),
}

/// Loads and validates engine and experiment configuration.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load engine settings with hierarchical merging.
    pub fn load() -> Result<EngineConfig> {
        let config: EngineConfig = Figment::new()
            .merge(Serialized::defaults(EngineConfig::default()))
            .merge(Yaml::file(".tracer/config.yaml"))
            .merge(Yaml::file(".tracer/local.yaml"))
            .merge(Env::prefixed("TRACER_").split("__"))
            .extract()
            .context("Failed to extract engine configuration")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load engine settings from one explicit file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<EngineConfig> {
        let config: EngineConfig = Figment::new()
            .merge(Serialized::defaults(EngineConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| {
                format!("Failed to load engine configuration from {}", path.as_ref().display())
            })?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load an experiment definition from a JSON or YAML file.
    pub fn load_experiment(path: impl AsRef<Path>) -> Result<ExperimentConfig> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let figment = match extension.as_str() {
            "json" => Figment::new().merge(Json::file(path)),
            "yaml" | "yml" => Figment::new().merge(Yaml::file(path)),
            other => return Err(ConfigError::UnsupportedExtension(other.to_string()).into()),
        };

        let config: ExperimentConfig = figment
            .extract()
            .with_context(|| format!("Failed to load experiment from {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
        if config.max_concurrent_runs == 0 {
            return Err(ConfigError::InvalidMaxConcurrentRuns(
                config.max_concurrent_runs,
            ));
        }
        if config.default_model_capacity == 0 {
            return Err(ConfigError::InvalidDefaultCapacity(
                config.default_model_capacity,
            ));
        }
        for (model, &capacity) in &config.model_capacities {
            if capacity == 0 {
                return Err(ConfigError::InvalidModelCapacity(model.clone(), capacity));
            }
        }
        if config.step_timeout_secs == Some(0) {
            return Err(ConfigError::ZeroStepTimeout);
        }
        Ok(())
    }
}
