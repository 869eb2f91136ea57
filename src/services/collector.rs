//! Embedding trajectory collection.
//!
//! The collector gathers completed embeddings as they arrive and, once a run
//! is complete, assembles the ordered trajectory for each embedding model:
//! text-modality invocations only, in increasing sequence order, skipping
//! invocations whose embedding failed (a gap, not a zero vector).

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::models::{Embedding, OutputModality, Run};

/// Per-run accumulator of embeddings, keyed by invocation and model.
#[derive(Debug, Default)]
pub struct EmbeddingCollector {
    by_invocation: HashMap<Uuid, HashMap<String, Embedding>>,
}

impl EmbeddingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed embedding.
    pub fn insert(&mut self, embedding: Embedding) {
        self.by_invocation
            .entry(embedding.invocation_id)
            .or_default()
            .insert(embedding.embedding_model.clone(), embedding);
    }

    /// Total embeddings collected, across models.
    pub fn len(&self) -> usize {
        self.by_invocation.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_invocation.is_empty()
    }

    /// Ordered embeddings of `run` for one embedding model.
    ///
    /// Only invocations that both produced text and have a completed
    /// embedding for exactly this model contribute; image invocations are
    /// excluded even if embeddings were erroneously stored for them. A run
    /// with no eligible invocations yields an empty list.
    pub fn embeddings_for(&self, run: &Run, embedding_model: &str) -> Vec<&Embedding> {
        run.invocations
            .iter()
            .filter(|inv| inv.modality() == OutputModality::Text)
            .filter_map(|inv| {
                self.by_invocation
                    .get(&inv.id)
                    .and_then(|by_model| by_model.get(embedding_model))
            })
            .collect()
    }

    /// Ordered trajectory of vectors of `run` for one embedding model.
    pub fn trajectory(&self, run: &Run, embedding_model: &str) -> Vec<Vec<f32>> {
        self.embeddings_for(run, embedding_model)
            .into_iter()
            .map(|e| e.vector.clone())
            .collect()
    }
}

/// Cosine distance of each trajectory point from the first point.
///
/// The first entry is always 0. Zero-norm vectors compare as distance 0 to
/// themselves and 1 to anything else.
pub fn semantic_drift(trajectory: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = trajectory.first() else {
        return Vec::new();
    };
    trajectory
        .iter()
        .map(|vector| cosine_distance(first, vector))
        .collect()
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        1.0 - dot / (norm_a * norm_b)
    } else if a == b {
        0.0
    } else {
        1.0
    }
}
