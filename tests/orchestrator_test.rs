//! Concurrency and pipeline tests for the experiment orchestrator.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

use trajectory_tracer::adapters::homology::VietorisRips;
use trajectory_tracer::adapters::models::default_registry;
use trajectory_tracer::domain::models::{
    EngineConfig, ExperimentConfig, ModelOutput, OutputModality, RunState,
};
use trajectory_tracer::domain::ports::{GenerativeModel, HomologyBackend, TextEmbedder};
use trajectory_tracer::services::orchestrator::{ExperimentEvent, ExperimentOrchestrator};
use trajectory_tracer::services::ModelRegistry;

// ========================
// Mock Implementations
// ========================

/// Text model producing unique outputs, tracking concurrent callers.
struct TrackedModel {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    counter: AtomicUsize,
}

impl TrackedModel {
    fn new(peak: Arc<AtomicUsize>) -> Self {
        Self {
            current: Arc::new(AtomicUsize::new(0)),
            peak,
            counter: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GenerativeModel for TrackedModel {
    fn name(&self) -> &str {
        "tracked"
    }

    fn modality(&self) -> OutputModality {
        OutputModality::Text
    }

    async fn generate(&self, input: &ModelOutput, seed: u64) -> Result<ModelOutput> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);

        let call = self.counter.fetch_add(1, Ordering::SeqCst);
        let prefix = input.as_text().map_or(0, str::len);
        Ok(ModelOutput::text(format!("out-{seed}-{prefix}-{call}")))
    }
}

/// Embedder mapping text length onto a tiny deterministic vector.
struct TinyEmbedder {
    fail_on: Option<String>,
}

#[async_trait]
impl TextEmbedder for TinyEmbedder {
    fn name(&self) -> &str {
        "tiny"
    }

    fn dimension(&self) -> usize {
        2
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail_on.as_deref() == Some(text) {
            bail!("synthetic embedding failure");
        }
        let len = text.len() as f32;
        Ok(vec![len, len * 0.5])
    }
}

struct BrokenHomology;

impl HomologyBackend for BrokenHomology {
    fn name(&self) -> &str {
        "broken"
    }

    fn compute(
        &self,
        _points: &[Vec<f32>],
        _max_dimension: usize,
    ) -> Result<Vec<Vec<(f64, f64)>>> {
        bail!("synthetic homology failure")
    }
}

fn tracked_registry(peak: Arc<AtomicUsize>, capacity: usize) -> Arc<ModelRegistry> {
    let mut registry = ModelRegistry::new();
    registry.register_generative(Arc::new(TrackedModel::new(peak)), capacity);
    registry.register_embedder(Arc::new(TinyEmbedder { fail_on: None }), 4);
    Arc::new(registry)
}

fn experiment(run_length: usize) -> ExperimentConfig {
    ExperimentConfig {
        networks: vec![vec!["tracked".to_string()]],
        seeds: vec![1, 2],
        prompts: vec!["p1".to_string(), "p2".to_string()],
        embedding_models: vec!["tiny".to_string()],
        run_length,
    }
}

// ========================
// Tests
// ========================

#[tokio::test]
async fn runs_complete_in_expansion_order_with_full_pipelines() {
    let peak = Arc::new(AtomicUsize::new(0));
    let registry = tracked_registry(Arc::clone(&peak), 8);
    let orchestrator =
        ExperimentOrchestrator::new(registry, Arc::new(VietorisRips), EngineConfig::default());

    let config = experiment(4);
    let report = orchestrator.run_experiment(&config).await.unwrap();

    assert_eq!(report.runs.len(), 4);
    assert_eq!(report.completed_runs(), 4);
    assert_eq!(report.failed_runs(), 0);

    // Expansion order: seeds outermost (one network), prompts inner.
    let expected = [(1, "p1"), (1, "p2"), (2, "p1"), (2, "p2")];
    for (run_report, (seed, prompt)) in report.runs.iter().zip(expected) {
        assert_eq!(run_report.run.seed, seed);
        assert_eq!(run_report.run.initial_prompt, prompt);
        assert_eq!(run_report.run.invocations.len(), 4);

        // Every text invocation embedded, in order.
        let embeddings = &run_report.embeddings["tiny"];
        assert_eq!(embeddings.len(), 4);
        let drift = &run_report.drift["tiny"];
        assert_eq!(drift.len(), 4);
        assert!(drift[0].abs() < 1e-6);

        // Full-run join barrier satisfied: diagram over all four points.
        let diagram = &run_report.diagrams["tiny"];
        assert_eq!(diagram.dimensions.len(), 2);
        assert!(!diagram.dimensions[0].generators.is_empty());
    }

    // Distinct run ids across the experiment.
    let ids: HashSet<_> = report.runs.iter().map(|r| r.run.id).collect();
    assert_eq!(ids.len(), 4);
}

#[tokio::test]
async fn model_pool_capacity_bounds_concurrent_calls() {
    let peak = Arc::new(AtomicUsize::new(0));
    let registry = tracked_registry(Arc::clone(&peak), 1);
    let config = EngineConfig {
        max_concurrent_runs: 4,
        ..EngineConfig::default()
    };
    let orchestrator = ExperimentOrchestrator::new(registry, Arc::new(VietorisRips), config);

    orchestrator.run_experiment(&experiment(3)).await.unwrap();

    // Four runs raced, but the shared model pool held one slot.
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn wider_pool_allows_parallel_calls() {
    let peak = Arc::new(AtomicUsize::new(0));
    let registry = tracked_registry(Arc::clone(&peak), 4);
    let config = EngineConfig {
        max_concurrent_runs: 4,
        ..EngineConfig::default()
    };
    let orchestrator = ExperimentOrchestrator::new(registry, Arc::new(VietorisRips), config);

    orchestrator.run_experiment(&experiment(3)).await.unwrap();

    assert!(peak.load(Ordering::SeqCst) > 1);
    assert!(peak.load(Ordering::SeqCst) <= 4);
}

#[tokio::test]
async fn failed_embedding_leaves_a_gap_not_a_zero_vector() {
    let peak = Arc::new(AtomicUsize::new(0));
    let mut registry = ModelRegistry::new();
    registry.register_generative(Arc::new(TrackedModel::new(peak)), 2);
    // First output of the first run has the shortest text; fail on one
    // specific output instead: seed 1, prompt "p", first call.
    registry.register_embedder(
        Arc::new(TinyEmbedder {
            fail_on: Some("out-1-1-0".to_string()),
        }),
        2,
    );

    let config = ExperimentConfig {
        networks: vec![vec!["tracked".to_string()]],
        seeds: vec![1],
        prompts: vec!["p".to_string()],
        embedding_models: vec!["tiny".to_string()],
        run_length: 3,
    };
    let orchestrator = ExperimentOrchestrator::new(
        Arc::new(registry),
        Arc::new(VietorisRips),
        EngineConfig::default(),
    );

    let report = orchestrator.run_experiment(&config).await.unwrap();
    let run_report = &report.runs[0];

    assert_eq!(run_report.state, RunState::Completed);
    assert_eq!(run_report.run.invocations.len(), 3);
    // One embedding failed: the trajectory keeps a gap.
    assert_eq!(run_report.embeddings["tiny"].len(), 2);
    assert_eq!(run_report.drift["tiny"].len(), 2);
    // The diagram is still produced from the remaining points.
    assert!(run_report.diagrams.contains_key("tiny"));
}

#[tokio::test]
async fn homology_failure_means_diagram_absent_not_run_failed() {
    let peak = Arc::new(AtomicUsize::new(0));
    let registry = tracked_registry(peak, 2);
    let orchestrator =
        ExperimentOrchestrator::new(registry, Arc::new(BrokenHomology), EngineConfig::default());

    let report = orchestrator.run_experiment(&experiment(3)).await.unwrap();

    assert_eq!(report.completed_runs(), 4);
    for run_report in &report.runs {
        assert!(run_report.diagrams.is_empty());
        assert!(!run_report.embeddings["tiny"].is_empty());
    }
}

#[tokio::test]
async fn failed_run_is_reported_not_retried() {
    struct OneShotThenBroken {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GenerativeModel for OneShotThenBroken {
        fn name(&self) -> &str {
            "flaky"
        }

        fn modality(&self) -> OutputModality {
            OutputModality::Text
        }

        async fn generate(&self, _input: &ModelOutput, _seed: u64) -> Result<ModelOutput> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                Ok(ModelOutput::text("only output"))
            } else {
                bail!("backend gone")
            }
        }
    }

    let mut registry = ModelRegistry::new();
    let model = Arc::new(OneShotThenBroken {
        calls: AtomicUsize::new(0),
    });
    registry.register_generative(Arc::clone(&model) as Arc<dyn GenerativeModel>, 1);
    registry.register_embedder(Arc::new(TinyEmbedder { fail_on: None }), 1);

    let config = ExperimentConfig {
        networks: vec![vec!["flaky".to_string()]],
        seeds: vec![1],
        prompts: vec!["p".to_string()],
        embedding_models: vec!["tiny".to_string()],
        run_length: 5,
    };
    let orchestrator = ExperimentOrchestrator::new(
        Arc::new(registry),
        Arc::new(VietorisRips),
        EngineConfig::default(),
    );

    let report = orchestrator.run_experiment(&config).await.unwrap();
    let run_report = &report.runs[0];

    assert_eq!(run_report.state, RunState::Failed);
    assert!(run_report.error.as_deref().unwrap().contains("backend gone"));
    // The successful first invocation is kept and embedded; no diagram.
    assert_eq!(run_report.run.invocations.len(), 1);
    assert_eq!(run_report.embeddings["tiny"].len(), 1);
    assert!(run_report.diagrams.is_empty());
    // No retry: exactly one failing call beyond the first.
    assert_eq!(model.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn image_invocations_are_not_embedded() {
    let config = EngineConfig::default();
    let registry = Arc::new(default_registry(&config));
    let orchestrator = ExperimentOrchestrator::new(registry, Arc::new(VietorisRips), config);

    let experiment = ExperimentConfig {
        networks: vec![vec!["dummy-t2i".to_string(), "dummy-i2t".to_string()]],
        seeds: vec![7],
        prompts: vec!["a lighthouse at dusk".to_string()],
        embedding_models: vec!["dummy-embed".to_string(), "dummy-embed-alt".to_string()],
        run_length: 4,
    };
    let report = orchestrator.run_experiment(&experiment).await.unwrap();
    let run_report = &report.runs[0];

    assert_eq!(run_report.state, RunState::Completed);
    assert_eq!(run_report.run.invocations.len(), 4);
    // Sequences 0 and 2 are images, 1 and 3 are text captions.
    for embedding_model in ["dummy-embed", "dummy-embed-alt"] {
        let embeddings = &run_report.embeddings[embedding_model];
        assert_eq!(embeddings.len(), 2);
        let text_ids: Vec<_> = run_report
            .run
            .invocations
            .iter()
            .filter(|inv| inv.modality() == OutputModality::Text)
            .map(|inv| inv.id)
            .collect();
        assert_eq!(
            embeddings.iter().map(|e| e.invocation_id).collect::<Vec<_>>(),
            text_ids
        );
    }
}

#[tokio::test]
async fn events_stream_reports_experiment_progress() {
    let peak = Arc::new(AtomicUsize::new(0));
    let registry = tracked_registry(peak, 4);
    let (tx, mut rx) = mpsc::channel(256);
    let orchestrator =
        ExperimentOrchestrator::new(registry, Arc::new(VietorisRips), EngineConfig::default())
            .with_events(tx);

    let config = experiment(2);
    let task = tokio::spawn(async move { orchestrator.run_experiment(&config).await });

    let mut started = 0;
    let mut invocations = 0;
    let mut finished = 0;
    let mut diagrams = 0;
    while let Some(event) = rx.recv().await {
        match event {
            ExperimentEvent::RunStarted { .. } => started += 1,
            ExperimentEvent::InvocationCompleted { .. } => invocations += 1,
            ExperimentEvent::RunFinished { state, .. } => {
                assert_eq!(state, RunState::Completed);
                finished += 1;
            }
            ExperimentEvent::DiagramCompleted { .. } => diagrams += 1,
        }
    }
    let report = task.await.unwrap().unwrap();

    assert_eq!(started, 4);
    assert_eq!(finished, 4);
    assert_eq!(invocations, 8);
    assert_eq!(diagrams, 4);
    assert_eq!(report.completed_runs(), 4);
}

#[tokio::test]
async fn unknown_model_fails_validation_before_any_run() {
    let peak = Arc::new(AtomicUsize::new(0));
    let registry = tracked_registry(peak, 1);
    let orchestrator =
        ExperimentOrchestrator::new(registry, Arc::new(VietorisRips), EngineConfig::default());

    let mut config = experiment(2);
    config.embedding_models.push("missing".to_string());

    assert!(orchestrator.run_experiment(&config).await.is_err());
}
