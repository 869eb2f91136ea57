//! Model registry and per-model worker pools.
//!
//! The registry is the explicit startup-populated mapping from model
//! identifier to a live model handle plus its capability descriptor
//! (modality, pool capacity). Each model is a logically singleton,
//! expensive-to-load resource: the instance is constructed once, reused
//! across invocations, and concurrent calls against it are capacity-limited
//! by a per-model semaphore.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{ExperimentConfig, ModelOutput, OutputModality};
use crate::domain::ports::{GenerativeModel, TextEmbedder};

/// Shared handle to a registered generative model and its worker pool.
#[derive(Clone)]
pub struct GenerativeHandle {
    model: Arc<dyn GenerativeModel>,
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl GenerativeHandle {
    pub fn name(&self) -> &str {
        self.model.name()
    }

    pub fn modality(&self) -> OutputModality {
        self.model.modality()
    }

    /// Maximum concurrent calls against this model.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Invoke the model, waiting for a pool slot first.
    pub async fn generate(&self, input: &ModelOutput, seed: u64) -> Result<ModelOutput> {
        let _permit = self.permits.acquire().await?;
        self.model.generate(input, seed).await
    }
}

/// Shared handle to a registered embedding model and its worker pool.
#[derive(Clone)]
pub struct EmbedderHandle {
    embedder: Arc<dyn TextEmbedder>,
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl EmbedderHandle {
    pub fn name(&self) -> &str {
        self.embedder.name()
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Embed one text, waiting for a pool slot first.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let _permit = self.permits.acquire().await?;
        self.embedder.embed(text).await
    }
}

/// Startup-populated mapping from model identifier to live handle.
#[derive(Default)]
pub struct ModelRegistry {
    generative: HashMap<String, GenerativeHandle>,
    embedders: HashMap<String, EmbedderHandle>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generative model with a pool of `capacity` slots.
    pub fn register_generative(&mut self, model: Arc<dyn GenerativeModel>, capacity: usize) {
        let capacity = capacity.max(1);
        self.generative.insert(
            model.name().to_string(),
            GenerativeHandle {
                model,
                permits: Arc::new(Semaphore::new(capacity)),
                capacity,
            },
        );
    }

    /// Register an embedding model with a pool of `capacity` slots.
    pub fn register_embedder(&mut self, embedder: Arc<dyn TextEmbedder>, capacity: usize) {
        let capacity = capacity.max(1);
        self.embedders.insert(
            embedder.name().to_string(),
            EmbedderHandle {
                embedder,
                permits: Arc::new(Semaphore::new(capacity)),
                capacity,
            },
        );
    }

    /// Look up a generative model handle.
    pub fn generative(&self, name: &str) -> EngineResult<GenerativeHandle> {
        self.generative
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownModel(name.to_string()))
    }

    /// Look up an embedding model handle.
    pub fn embedder(&self, name: &str) -> EngineResult<EmbedderHandle> {
        self.embedders
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownModel(name.to_string()))
    }

    /// Static modality lookup for a generative model identifier.
    pub fn output_modality(&self, name: &str) -> EngineResult<OutputModality> {
        Ok(self.generative(name)?.modality())
    }

    /// Registered generative model names, sorted.
    pub fn generative_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.generative.keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered embedding model names, sorted.
    pub fn embedder_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.embedders.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check that every model an experiment references is registered.
    pub fn validate_experiment(&self, config: &ExperimentConfig) -> EngineResult<()> {
        for network in &config.networks {
            for model in network {
                self.generative(model)?;
            }
        }
        for embedder in &config.embedding_models {
            self.embedder(embedder)?;
        }
        Ok(())
    }
}
