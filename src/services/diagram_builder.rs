//! Persistence diagram construction.
//!
//! The builder turns one embedding trajectory into a persistence diagram:
//! it feeds the point cloud to the homology backend, then derives per-
//! dimension persistence and normalized persistence entropy. The derivation
//! is pure and order-independent; recomputing it from the same trajectory
//! yields the same diagram.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{DiagramDimension, Generator, PersistenceDiagram};
use crate::domain::ports::HomologyBackend;

/// Builds persistence diagrams from embedding trajectories.
pub struct PersistenceDiagramBuilder {
    backend: Arc<dyn HomologyBackend>,
    max_dimension: usize,
}

impl PersistenceDiagramBuilder {
    pub fn new(backend: Arc<dyn HomologyBackend>, max_dimension: usize) -> Self {
        Self {
            backend,
            max_dimension,
        }
    }

    /// Compute the diagram for one (run, embedding model) trajectory.
    ///
    /// Fails with a homology error when the backend rejects the point
    /// cloud; callers treat the resulting absent diagram as a valid
    /// terminal state.
    pub fn build(
        &self,
        run_id: Uuid,
        embedding_model: &str,
        trajectory: &[Vec<f32>],
    ) -> EngineResult<PersistenceDiagram> {
        let started_at = Utc::now();
        let raw = self
            .backend
            .compute(trajectory, self.max_dimension)
            .map_err(|err| EngineError::Homology {
                run_id,
                embedding_model: embedding_model.to_string(),
                message: err.to_string(),
            })?;

        let dimensions = raw
            .into_iter()
            .enumerate()
            .map(|(dimension, pairs)| {
                let generators: Vec<Generator> = pairs
                    .into_iter()
                    .map(|(birth, death)| Generator::new(birth, death))
                    .collect();
                let entropy = persistence_entropy(&generators);
                DiagramDimension {
                    dimension,
                    generators,
                    entropy,
                }
            })
            .collect();

        let diagram = PersistenceDiagram {
            id: Uuid::new_v4(),
            run_id,
            embedding_model: embedding_model.to_string(),
            dimensions,
            started_at,
            completed_at: Utc::now(),
        };
        debug!(
            run_id = %run_id,
            embedding_model,
            generators = diagram.generator_count(),
            "persistence diagram built"
        );
        Ok(diagram)
    }
}

/// Normalized persistence entropy of one dimension's generators.
///
/// With `total` the summed persistence of finite generators and
/// `p_i = persistence_i / total`, the entropy is `-sum(p_i * ln(p_i))`.
/// Undefined (`None`) when the dimension has no generators or zero total
/// persistence; a single positive-persistence generator yields 0.
pub fn persistence_entropy(generators: &[Generator]) -> Option<f64> {
    let persistences: Vec<f64> = generators
        .iter()
        .filter(|g| g.is_finite())
        .map(Generator::persistence)
        .collect();

    let total: f64 = persistences.iter().sum();
    if persistences.is_empty() || total <= 0.0 {
        return None;
    }

    let entropy = -persistences
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| {
            let ratio = p / total;
            ratio * ratio.ln()
        })
        .sum::<f64>();
    Some(entropy)
}
