//! Engine configuration.
//!
//! Runtime knobs for the orchestrator: how many runs advance in parallel,
//! how much concurrency each model pool allows, the per-step timeout, the
//! maximum homology dimension, and where results are exported.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Orchestration and analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of runs advancing concurrently.
    pub max_concurrent_runs: usize,
    /// Concurrent calls allowed against a model with no explicit capacity.
    pub default_model_capacity: usize,
    /// Per-model concurrency overrides, keyed by model identifier.
    pub model_capacities: HashMap<String, usize>,
    /// Per-step generation timeout in seconds; `None` disables the timeout.
    pub step_timeout_secs: Option<u64>,
    /// Highest homology dimension computed for persistence diagrams.
    pub max_homology_dimension: usize,
    /// Directory experiment results are exported under.
    pub output_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: 4,
            default_model_capacity: 1,
            model_capacities: HashMap::new(),
            step_timeout_secs: None,
            max_homology_dimension: 1,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl EngineConfig {
    /// Pool capacity for a model identifier.
    pub fn capacity_for(&self, model: &str) -> usize {
        self.model_capacities
            .get(model)
            .copied()
            .unwrap_or(self.default_model_capacity)
    }

    /// Per-step timeout as a `Duration`, if configured.
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_falls_back_to_default() {
        let mut config = EngineConfig::default();
        config.model_capacities.insert("gpu-model".to_string(), 2);

        assert_eq!(config.capacity_for("gpu-model"), 2);
        assert_eq!(config.capacity_for("other"), 1);
    }

    #[test]
    fn timeout_disabled_by_default() {
        assert!(EngineConfig::default().step_timeout().is_none());
    }
}
