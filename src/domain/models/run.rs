//! Run domain model.
//!
//! A run is one trajectory of invocations over a cyclic model network,
//! starting from one prompt and seed. Runs advance through a small state
//! machine: `Pending -> Running -> Completed | Failed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::invocation::Invocation;
use super::network::Network;
use crate::domain::errors::{EngineError, EngineResult};

/// Why a run stopped advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// The run produced `max_length` invocations without repeating.
    LengthExhausted,
    /// An output hash repeated one seen `loop_length` steps earlier.
    Duplicate { loop_length: usize },
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LengthExhausted => write!(f, "length_exhausted"),
            Self::Duplicate { loop_length } => write!(f, "duplicate(loop_length={loop_length})"),
        }
    }
}

/// Observable state of a run's driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the state admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One trajectory of invocations over a cyclic model network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    pub network: Network,
    pub seed: u64,
    pub initial_prompt: String,
    /// Upper bound on the number of invocations, > 0.
    pub max_length: usize,
    /// Invocations in increasing `sequence_number` order, gapless from 0.
    pub invocations: Vec<Invocation>,
    /// Set exactly once, when the run completes.
    pub stop_reason: Option<StopReason>,
    pub started_at: DateTime<Utc>,
}

impl Run {
    /// Create a pending run, validating the length bound.
    pub fn new(
        network: Network,
        seed: u64,
        initial_prompt: impl Into<String>,
        max_length: usize,
    ) -> EngineResult<Self> {
        if max_length == 0 {
            return Err(EngineError::Validation(
                "run max_length must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            network,
            seed,
            initial_prompt: initial_prompt.into(),
            max_length,
            invocations: Vec::new(),
            stop_reason: None,
            started_at: Utc::now(),
        })
    }

    /// The model identifier for a sequence position in this run.
    pub fn model_at(&self, sequence_number: usize) -> &str {
        self.network.model_at(sequence_number)
    }

    /// The sequence number the next invocation would take.
    pub fn next_sequence_number(&self) -> usize {
        self.invocations.len()
    }

    pub fn last_invocation(&self) -> Option<&Invocation> {
        self.invocations.last()
    }

    /// A run is complete iff it reached `max_length - 1` with output set, or
    /// stopped early on a detected duplicate.
    pub fn is_complete(&self) -> bool {
        match self.stop_reason {
            Some(StopReason::Duplicate { .. }) => true,
            _ => self
                .invocations
                .iter()
                .any(|inv| inv.sequence_number == self.max_length - 1),
        }
    }
}
