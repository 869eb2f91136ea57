//! Experiment orchestration.
//!
//! Executes many runs concurrently, each one a strictly ordered pipeline
//! (step *i+1* cannot start before step *i*'s output exists), up to a
//! configured run-concurrency limit. Embedding computations fan out as each
//! text invocation completes and join before diagram building (the builder
//! needs the full ordered trajectory, not a prefix). Failed runs stay
//! failed and are reported; the orchestrator never retries.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{
    Embedding, EngineConfig, ExperimentConfig, Invocation, PersistenceDiagram, Run, RunState,
};
use crate::domain::ports::HomologyBackend;
use crate::services::collector::{semantic_drift, EmbeddingCollector};
use crate::services::diagram_builder::PersistenceDiagramBuilder;
use crate::services::registry::ModelRegistry;
use crate::services::run_driver::{RunDriver, RunOutcome};

/// Progress events emitted while an experiment executes, for incremental
/// consumption by CLI or monitoring layers.
#[derive(Debug, Clone)]
pub enum ExperimentEvent {
    /// A run began driving.
    RunStarted { run_id: Uuid },
    /// One invocation of a run completed.
    InvocationCompleted {
        run_id: Uuid,
        sequence_number: usize,
    },
    /// A run reached a terminal state.
    RunFinished { run_id: Uuid, state: RunState },
    /// A persistence diagram finished computing.
    DiagramCompleted {
        run_id: Uuid,
        embedding_model: String,
    },
}

/// Everything produced for one run.
#[derive(Debug)]
pub struct RunReport {
    pub run: Run,
    pub state: RunState,
    /// Failure description when `state` is `Failed`.
    pub error: Option<String>,
    /// Completed embeddings per embedding model, in sequence order.
    pub embeddings: HashMap<String, Vec<Embedding>>,
    /// Cosine drift from the trajectory's first vector, per embedding model.
    pub drift: HashMap<String, Vec<f32>>,
    /// Diagrams per embedding model. A missing entry means the run failed
    /// or the homology computation did; absence is a valid terminal state.
    pub diagrams: HashMap<String, PersistenceDiagram>,
}

/// Results of a whole experiment, in expansion order.
#[derive(Debug)]
pub struct ExperimentReport {
    pub runs: Vec<RunReport>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl ExperimentReport {
    /// Number of runs that reached `Completed`.
    pub fn completed_runs(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| r.state == RunState::Completed)
            .count()
    }

    /// Number of runs that ended `Failed`.
    pub fn failed_runs(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| r.state == RunState::Failed)
            .count()
    }
}

/// Schedules runs, embeddings, and diagram computations.
pub struct ExperimentOrchestrator {
    registry: Arc<ModelRegistry>,
    driver: RunDriver,
    diagram_builder: Arc<PersistenceDiagramBuilder>,
    config: EngineConfig,
    events: Option<mpsc::Sender<ExperimentEvent>>,
}

impl ExperimentOrchestrator {
    pub fn new(
        registry: Arc<ModelRegistry>,
        homology: Arc<dyn HomologyBackend>,
        config: EngineConfig,
    ) -> Self {
        let driver = RunDriver::new(Arc::clone(&registry), config.step_timeout());
        let diagram_builder = Arc::new(PersistenceDiagramBuilder::new(
            homology,
            config.max_homology_dimension,
        ));
        Self {
            registry,
            driver,
            diagram_builder,
            config,
            events: None,
        }
    }

    /// Attach a progress event channel.
    pub fn with_events(mut self, events: mpsc::Sender<ExperimentEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Execute every run of an experiment and gather the reports.
    ///
    /// Reports come back in expansion order regardless of completion order.
    pub async fn run_experiment(
        &self,
        experiment: &ExperimentConfig,
    ) -> EngineResult<ExperimentReport> {
        self.registry.validate_experiment(experiment)?;
        let runs = experiment.expand_runs()?;
        let started_at = Utc::now();
        info!(
            runs = runs.len(),
            max_concurrent_runs = self.config.max_concurrent_runs,
            "experiment started"
        );

        let run_limit = Arc::new(Semaphore::new(self.config.max_concurrent_runs.max(1)));
        let embedding_models: Arc<[String]> = experiment.embedding_models.clone().into();

        let mut tasks: JoinSet<(usize, RunReport)> = JoinSet::new();
        let run_count = runs.len();
        for (index, run) in runs.into_iter().enumerate() {
            let limit = Arc::clone(&run_limit);
            let worker = RunWorker {
                driver: self.driver.clone(),
                registry: Arc::clone(&self.registry),
                diagram_builder: Arc::clone(&self.diagram_builder),
                embedding_models: Arc::clone(&embedding_models),
                events: self.events.clone(),
            };
            tasks.spawn(async move {
                // The semaphore is never closed; a failed acquire only means
                // shutdown, in which case running unthrottled is harmless.
                let _permit = limit.acquire_owned().await.ok();
                (index, worker.process(run).await)
            });
        }

        let mut slots: Vec<Option<RunReport>> = (0..run_count).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, report)) => slots[index] = Some(report),
                Err(err) => error!(error = %err, "run worker panicked"),
            }
        }

        let report = ExperimentReport {
            runs: slots.into_iter().flatten().collect(),
            started_at,
            completed_at: Utc::now(),
        };
        info!(
            completed = report.completed_runs(),
            failed = report.failed_runs(),
            "experiment finished"
        );
        Ok(report)
    }
}

/// Per-run pipeline: drive the run, fan out embeddings, join, build diagrams.
struct RunWorker {
    driver: RunDriver,
    registry: Arc<ModelRegistry>,
    diagram_builder: Arc<PersistenceDiagramBuilder>,
    embedding_models: Arc<[String]>,
    events: Option<mpsc::Sender<ExperimentEvent>>,
}

impl RunWorker {
    async fn process(&self, run: Run) -> RunReport {
        let run_id = run.id;
        self.emit(ExperimentEvent::RunStarted { run_id }).await;

        // Drive the run and consume its invocation stream concurrently;
        // embeddings are spawned the moment each text invocation lands.
        let (tx, rx) = mpsc::channel(run.max_length.max(1));
        let (outcome, mut embed_tasks) =
            tokio::join!(self.driver.drive(run, tx), self.consume(rx, run_id));

        let mut collector = EmbeddingCollector::new();
        while let Some(joined) = embed_tasks.join_next().await {
            match joined {
                Ok(Ok(embedding)) => collector.insert(embedding),
                Ok(Err(err)) => {
                    warn!(run_id = %run_id, error = %err, "embedding failed, trajectory keeps a gap");
                }
                Err(err) => error!(run_id = %run_id, error = %err, "embedding task panicked"),
            }
        }

        let (run, state, error) = match outcome {
            RunOutcome::Completed(run) => (run, RunState::Completed, None),
            RunOutcome::Failed { run, error } => (run, RunState::Failed, Some(error.to_string())),
            // This consumer never hangs up early, but map it defensively.
            RunOutcome::Abandoned(run) => (
                run,
                RunState::Failed,
                Some("run abandoned before completion".to_string()),
            ),
        };
        self.emit(ExperimentEvent::RunFinished { run_id, state }).await;

        let mut embeddings = HashMap::new();
        let mut drift = HashMap::new();
        let mut trajectories = Vec::with_capacity(self.embedding_models.len());
        for model in self.embedding_models.iter() {
            let ordered: Vec<Embedding> = collector
                .embeddings_for(&run, model)
                .into_iter()
                .cloned()
                .collect();
            let trajectory = collector.trajectory(&run, model);
            drift.insert(model.clone(), semantic_drift(&trajectory));
            embeddings.insert(model.clone(), ordered);
            trajectories.push((model.clone(), trajectory));
        }

        // Join barrier: diagrams only for complete runs, from the full
        // ordered trajectory; one computation per embedding model.
        let mut diagrams = HashMap::new();
        if state == RunState::Completed {
            let built = join_all(trajectories.into_iter().map(|(model, trajectory)| async move {
                let diagram = self.build_diagram(run_id, &model, trajectory).await;
                (model, diagram)
            }))
            .await;
            for (model, diagram) in built {
                if let Some(diagram) = diagram {
                    diagrams.insert(model, diagram);
                }
            }
        }

        RunReport {
            run,
            state,
            error,
            embeddings,
            drift,
            diagrams,
        }
    }

    /// Receive invocations in order, spawning embedding tasks for text ones.
    async fn consume(
        &self,
        mut invocations: mpsc::Receiver<Invocation>,
        run_id: Uuid,
    ) -> JoinSet<Result<Embedding, EngineError>> {
        let mut embed_tasks: JoinSet<Result<Embedding, EngineError>> = JoinSet::new();
        while let Some(invocation) = invocations.recv().await {
            self.emit(ExperimentEvent::InvocationCompleted {
                run_id,
                sequence_number: invocation.sequence_number,
            })
            .await;

            let Some(text) = invocation.output.as_text().map(str::to_string) else {
                continue;
            };
            for model in self.embedding_models.iter() {
                let Ok(handle) = self.registry.embedder(model) else {
                    // Unreachable after experiment validation.
                    continue;
                };
                let model = model.clone();
                let text = text.clone();
                let invocation_id = invocation.id;
                embed_tasks.spawn(async move {
                    let started_at = Utc::now();
                    match handle.embed(&text).await {
                        Ok(vector) => Ok(Embedding {
                            id: Uuid::new_v4(),
                            invocation_id,
                            embedding_model: model,
                            vector,
                            started_at,
                            completed_at: Utc::now(),
                        }),
                        Err(err) => Err(EngineError::Embedding {
                            invocation_id,
                            model,
                            message: err.to_string(),
                        }),
                    }
                });
            }
        }
        embed_tasks
    }

    /// Run the homology computation off the async runtime.
    async fn build_diagram(
        &self,
        run_id: Uuid,
        embedding_model: &str,
        trajectory: Vec<Vec<f32>>,
    ) -> Option<PersistenceDiagram> {
        let builder = Arc::clone(&self.diagram_builder);
        let model = embedding_model.to_string();
        let result =
            tokio::task::spawn_blocking(move || builder.build(run_id, &model, &trajectory)).await;

        match result {
            Ok(Ok(diagram)) => {
                self.emit(ExperimentEvent::DiagramCompleted {
                    run_id,
                    embedding_model: embedding_model.to_string(),
                })
                .await;
                Some(diagram)
            }
            Ok(Err(err)) => {
                warn!(run_id = %run_id, embedding_model, error = %err, "persistence diagram absent");
                None
            }
            Err(err) => {
                error!(run_id = %run_id, embedding_model, error = %err, "diagram task panicked");
                None
            }
        }
    }

    async fn emit(&self, event: ExperimentEvent) {
        if let Some(tx) = &self.events {
            debug!(?event, "experiment event");
            let _ = tx.send(event).await;
        }
    }
}
