//! Ports: abstract contracts the engine consumes from collaborators.

pub mod embedder;
pub mod generative_model;
pub mod homology;

pub use embedder::TextEmbedder;
pub use generative_model::GenerativeModel;
pub use homology::HomologyBackend;
