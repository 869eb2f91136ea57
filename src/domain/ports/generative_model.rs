//! Generative model port.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::{ModelOutput, OutputModality};

/// Trait for generative model backends.
///
/// A generative model transforms one piece of content into another, in a
/// fixed output modality declared up front. Implementations are long-lived
/// and expensive to construct; the engine builds each one once at registry
/// setup and reuses it across invocations, limiting concurrent calls per the
/// registered pool capacity.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Model identifier used in networks and experiment configs.
    fn name(&self) -> &str;

    /// The modality every output of this model has.
    fn modality(&self) -> OutputModality;

    /// Transform `input` into this model's output modality.
    ///
    /// The call may be slow and may suspend; failures are opaque to the
    /// engine, which maps them to a run-fatal generation error.
    async fn generate(&self, input: &ModelOutput, seed: u64) -> Result<ModelOutput>;
}
