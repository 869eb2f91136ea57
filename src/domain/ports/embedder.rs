//! Text embedder port.

use anyhow::Result;
use async_trait::async_trait;

/// Trait for embedding model backends.
///
/// Embedders map text to a fixed-length vector. Only text invocations are
/// ever embedded; the trajectories analyzed downstream are text-only by
/// design. Determinism for a fixed (model, content) pair is assumed by tests
/// but not enforced.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embedding model name recorded on each produced embedding.
    fn name(&self) -> &str;

    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;

    /// Embed one text into a `dimension()`-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
