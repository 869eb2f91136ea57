//! Embedding domain model.
//!
//! An embedding is the fixed-length vector a named embedding model produced
//! for one invocation's text output. Image invocations are never embedded;
//! the trajectories analyzed downstream are text-only even when the network
//! interleaves image-producing models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One embedding vector for one invocation, by one embedding model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub id: Uuid,
    pub invocation_id: Uuid,
    /// Name of the embedding model that produced the vector.
    pub embedding_model: String,
    pub vector: Vec<f32>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl Embedding {
    /// Vector dimensionality.
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }

    /// Wall-clock duration of the embedding computation, in seconds.
    pub fn duration(&self) -> f64 {
        let delta = self.completed_at - self.started_at;
        delta.num_milliseconds() as f64 / 1000.0
    }
}
