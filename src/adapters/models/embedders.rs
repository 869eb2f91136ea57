//! Deterministic embedding models.

use anyhow::Result;
use async_trait::async_trait;

use super::digest_stream;
use crate::domain::ports::TextEmbedder;

/// Vector length shared by the built-in embedders.
pub const EMBEDDING_DIM: usize = 768;

/// Embedder deriving each component from a digest stream over the text.
#[derive(Debug, Default)]
pub struct DummyEmbedder;

#[async_trait]
impl TextEmbedder for DummyEmbedder {
    fn name(&self) -> &str {
        "dummy-embed"
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let bytes = digest_stream(text.as_bytes(), EMBEDDING_DIM);
        Ok(bytes.into_iter().map(|b| f32::from(b) / 255.0).collect())
    }
}

/// Embedder deriving components from codepoint positions, so that nearby
/// texts land on nearby vectors (unlike the digest embedder, which
/// scatters).
#[derive(Debug, Default)]
pub struct AltDummyEmbedder;

#[async_trait]
impl TextEmbedder for AltDummyEmbedder {
    fn name(&self) -> &str {
        "dummy-embed-alt"
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector: Vec<f32> = text
            .chars()
            .take(EMBEDDING_DIM)
            .map(|c| (c as u32 % 256) as f32 / 255.0)
            .collect();
        vector.resize(EMBEDDING_DIM, 0.0);
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn digest_embedder_is_deterministic() {
        let embedder = DummyEmbedder;
        let a = embedder.embed("same text").await.unwrap();
        let b = embedder.embed("same text").await.unwrap();
        let c = embedder.embed("other text").await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), EMBEDDING_DIM);
        assert!(a.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[tokio::test]
    async fn codepoint_embedder_pads_short_texts() {
        let embedder = AltDummyEmbedder;
        let vector = embedder.embed("ab").await.unwrap();
        assert_eq!(vector.len(), EMBEDDING_DIM);
        assert!((vector[0] - (b'a' as f32) / 255.0).abs() < 1e-6);
        assert_eq!(vector[2], 0.0);
    }
}
