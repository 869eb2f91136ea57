//! Experiment configuration.
//!
//! An experiment is the Cartesian product driver: one run per
//! (network, seed, prompt) triple, all sharing `run_length`, with every
//! listed embedding model applied to every run's text invocations.

use serde::{Deserialize, Serialize};

use super::network::Network;
use super::run::Run;
use crate::domain::errors::{EngineError, EngineResult};

/// Declarative description of a trajectory experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Model networks, each an ordered cyclic list of model identifiers.
    pub networks: Vec<Vec<String>>,
    /// Generation seeds.
    pub seeds: Vec<u64>,
    /// Initial text prompts.
    pub prompts: Vec<String>,
    /// Embedding model names applied to every run.
    pub embedding_models: Vec<String>,
    /// Number of invocations each run may produce at most.
    pub run_length: usize,
}

impl ExperimentConfig {
    /// Validate list shapes and the length bound.
    pub fn validate(&self) -> EngineResult<()> {
        if self.networks.is_empty() {
            return Err(EngineError::Validation(
                "networks list cannot be empty".to_string(),
            ));
        }
        if self.seeds.is_empty() {
            return Err(EngineError::Validation(
                "seeds list cannot be empty".to_string(),
            ));
        }
        if self.prompts.is_empty() {
            return Err(EngineError::Validation(
                "prompts list cannot be empty".to_string(),
            ));
        }
        if self.embedding_models.is_empty() {
            return Err(EngineError::Validation(
                "embedding_models list cannot be empty".to_string(),
            ));
        }
        if self.run_length == 0 {
            return Err(EngineError::Validation(
                "run_length must be greater than 0".to_string(),
            ));
        }
        for network in &self.networks {
            if network.is_empty() {
                return Err(EngineError::Validation(
                    "network must contain at least one model".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Expand into pending runs, one per (network, seed, prompt) triple.
    ///
    /// Expansion order is deterministic: networks outermost, then seeds,
    /// then prompts.
    pub fn expand_runs(&self) -> EngineResult<Vec<Run>> {
        self.validate()?;
        let mut runs =
            Vec::with_capacity(self.networks.len() * self.seeds.len() * self.prompts.len());
        for network in &self.networks {
            for &seed in &self.seeds {
                for prompt in &self.prompts {
                    let network = Network::new(network.clone())?;
                    runs.push(Run::new(network, seed, prompt.clone(), self.run_length)?);
                }
            }
        }
        Ok(runs)
    }

    /// Number of runs this experiment expands to.
    pub fn run_count(&self) -> usize {
        self.networks.len() * self.seeds.len() * self.prompts.len()
    }
}
