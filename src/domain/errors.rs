//! Domain errors for the trajectory engine.
//!
//! The taxonomy mirrors the blast radius of each failure: a generation
//! failure is fatal to its run, an embedding failure only to that embedding,
//! and a homology failure only means the diagram is absent. The engine never
//! retries; callers own retry policy.

use thiserror::Error;
use uuid::Uuid;

/// Engine-level errors, each carrying enough context for the caller to
/// decide on retry (run id, sequence number, model id).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The external generator call failed, timed out, or returned the wrong
    /// modality. Fatal to the enclosing run.
    #[error("generation failed in run {run_id} at sequence {sequence_number} (model {model}): {message}")]
    Generation {
        run_id: Uuid,
        sequence_number: usize,
        model: String,
        message: String,
    },

    /// The external embed call failed. Fatal to that embedding only; the
    /// invocation becomes a gap in the affected trajectory.
    #[error("embedding failed for invocation {invocation_id} (model {model}): {message}")]
    Embedding {
        invocation_id: Uuid,
        model: String,
        message: String,
    },

    /// The external homology computation failed. The corresponding diagram
    /// is not produced; absence is a valid terminal state.
    #[error("homology computation failed for run {run_id} (embedding model {embedding_model}): {message}")]
    Homology {
        run_id: Uuid,
        embedding_model: String,
        message: String,
    },

    /// A model identifier was not found in the registry.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// A configuration or domain invariant was violated.
    #[error("validation failed: {0}")]
    Validation(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Whether this failure is fatal to its enclosing run.
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(self, Self::Generation { .. })
    }
}
