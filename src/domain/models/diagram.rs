//! Persistence diagram domain model.
//!
//! A persistence diagram summarizes the topological features of one embedding
//! trajectory: per homology dimension, a set of generators (birth/death
//! pairs) and, when defined, the normalized persistence entropy of the
//! dimension. Diagrams belong to exactly one (run, embedding model) pair and
//! are read-only once computed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One birth/death pair in a persistence diagram.
///
/// Essential classes that never die carry `death = f64::INFINITY`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub birth: f64,
    pub death: f64,
}

impl Generator {
    pub fn new(birth: f64, death: f64) -> Self {
        Self { birth, death }
    }

    /// Lifetime of the feature, `death - birth`.
    pub fn persistence(&self) -> f64 {
        self.death - self.birth
    }

    /// Whether the feature dies at a finite filtration value.
    pub fn is_finite(&self) -> bool {
        self.death.is_finite()
    }
}

/// Generators and entropy for one homology dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramDimension {
    pub dimension: usize,
    pub generators: Vec<Generator>,
    /// Normalized persistence entropy; `None` when the dimension has no
    /// generators or zero total finite persistence.
    pub entropy: Option<f64>,
}

/// Topological summary of one (run, embedding model) trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceDiagram {
    pub id: Uuid,
    pub run_id: Uuid,
    pub embedding_model: String,
    /// One entry per homology dimension, from 0 up to the configured maximum.
    pub dimensions: Vec<DiagramDimension>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl PersistenceDiagram {
    /// Wall-clock duration of the homology computation, in seconds.
    pub fn duration(&self) -> f64 {
        let delta = self.completed_at - self.started_at;
        delta.num_milliseconds() as f64 / 1000.0
    }

    /// Total number of generators across all dimensions.
    pub fn generator_count(&self) -> usize {
        self.dimensions.iter().map(|d| d.generators.len()).sum()
    }
}
