//! Invocation domain model.
//!
//! An invocation is one model call within a run, at a specific sequence
//! position. Its input is the previous invocation's output (or the run's
//! initial prompt at position 0), and its output is exactly one of text or
//! encoded image bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Output modality of a generative model, known a priori per model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputModality {
    /// The model produces text.
    Text,
    /// The model produces an encoded image.
    Image,
}

impl OutputModality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

impl std::fmt::Display for OutputModality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content flowing between models: either text or encoded image bytes.
///
/// The run's initial prompt enters the chain as `Text`; every later input is
/// the previous invocation's output, whichever variant that was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "modality", rename_all = "snake_case")]
pub enum ModelOutput {
    Text { text: String },
    Image { bytes: Vec<u8> },
}

impl ModelOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Image { bytes: bytes.into() }
    }

    /// The modality this content belongs to.
    pub fn modality(&self) -> OutputModality {
        match self {
            Self::Text { .. } => OutputModality::Text,
            Self::Image { .. } => OutputModality::Image,
        }
    }

    /// The text content, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Image { .. } => None,
        }
    }

    /// The encoded image bytes, if this is an image.
    pub fn as_image(&self) -> Option<&[u8]> {
        match self {
            Self::Text { .. } => None,
            Self::Image { bytes } => Some(bytes),
        }
    }
}

/// One model call within a run.
///
/// Invocations are exclusively owned by their run and totally ordered by
/// `sequence_number`. An invocation only exists once its output is set; a
/// failed generator call records nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    pub id: Uuid,
    pub run_id: Uuid,
    /// Model identifier, equal to `network[sequence_number mod len]`.
    pub model: String,
    pub sequence_number: usize,
    pub seed: u64,
    pub output: ModelOutput,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl Invocation {
    /// Output modality of this invocation.
    pub fn modality(&self) -> OutputModality {
        self.output.modality()
    }

    /// Wall-clock duration of the generator call, in seconds.
    pub fn duration(&self) -> f64 {
        let delta = self.completed_at - self.started_at;
        delta.num_milliseconds() as f64 / 1000.0
    }
}
