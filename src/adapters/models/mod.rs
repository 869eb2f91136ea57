//! Built-in deterministic models.
//!
//! These models exist for tests, dry runs, and example experiments: every
//! output is a pure function of (input, seed), derived from SHA-256 digests
//! so trajectories are reproducible without any external backend. Real
//! generative or embedding backends plug in through the same ports.

mod generative;
mod embedders;

pub use embedders::{AltDummyEmbedder, DummyEmbedder, EMBEDDING_DIM};
pub use generative::{DummyImageToText, DummyTextToImage, DummyTextToText};

use std::sync::Arc;

use crate::domain::models::EngineConfig;
use crate::services::registry::ModelRegistry;

/// Registry pre-populated with every built-in model, pool capacities taken
/// from the engine configuration.
pub fn default_registry(config: &EngineConfig) -> ModelRegistry {
    let mut registry = ModelRegistry::new();

    let t2i = Arc::new(DummyTextToImage::default());
    let i2t = Arc::new(DummyImageToText::default());
    let t2t = Arc::new(DummyTextToText::default());
    registry.register_generative(t2i, config.capacity_for("dummy-t2i"));
    registry.register_generative(i2t, config.capacity_for("dummy-i2t"));
    registry.register_generative(t2t, config.capacity_for("dummy-t2t"));

    let embed = Arc::new(DummyEmbedder::default());
    let embed_alt = Arc::new(AltDummyEmbedder::default());
    registry.register_embedder(embed, config.capacity_for("dummy-embed"));
    registry.register_embedder(embed_alt, config.capacity_for("dummy-embed-alt"));

    registry
}

/// Deterministic byte stream of `len` bytes derived from `material`.
///
/// Counter-mode SHA-256: block `i` is `sha256(material || i)`.
pub(crate) fn digest_stream(material: &[u8], len: usize) -> Vec<u8> {
    use sha2::{Digest, Sha256};

    let mut bytes = Vec::with_capacity(len);
    let mut counter: u64 = 0;
    while bytes.len() < len {
        let mut hasher = Sha256::new();
        hasher.update(material);
        hasher.update(counter.to_le_bytes());
        bytes.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    bytes.truncate(len);
    bytes
}
