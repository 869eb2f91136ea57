//! Filesystem export of experiment results.
//!
//! Completed runs, embedding trajectories, and persistence diagrams are
//! written as JSON documents under the output directory; image outputs are
//! decoded and saved as PNG files next to them:
//!
//! ```text
//! <output_dir>/
//!   summary.json
//!   runs/<run-id>.json
//!   diagrams/<run-id>-<embedding-model>.json
//!   images/<run-id>/<sequence>.png
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::models::{Invocation, OutputModality, RunState, StopReason};
use crate::services::orchestrator::{ExperimentReport, RunReport};

/// Writes experiment results under one output directory.
pub struct ExperimentExporter {
    output_dir: PathBuf,
}

#[derive(Serialize)]
struct SummaryDocument {
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    runs: usize,
    completed: usize,
    failed: usize,
}

#[derive(Serialize)]
struct RunDocument {
    run_id: Uuid,
    network: Vec<String>,
    seed: u64,
    initial_prompt: String,
    max_length: usize,
    state: RunState,
    stop_reason: Option<StopReason>,
    error: Option<String>,
    invocations: Vec<InvocationDocument>,
    trajectories: BTreeMap<String, TrajectoryDocument>,
}

#[derive(Serialize)]
struct InvocationDocument {
    id: Uuid,
    model: String,
    sequence_number: usize,
    modality: OutputModality,
    duration_secs: f64,
    output_text: Option<String>,
    image_file: Option<String>,
}

#[derive(Serialize)]
struct TrajectoryDocument {
    embedding_model: String,
    dimension: usize,
    vectors: Vec<Vec<f32>>,
    semantic_drift: Vec<f32>,
}

impl ExperimentExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write the whole report. Undecodable image outputs are skipped with a
    /// warning rather than aborting the export.
    pub fn export(&self, report: &ExperimentReport) -> Result<()> {
        fs::create_dir_all(self.output_dir.join("runs"))
            .with_context(|| format!("failed to create {}", self.output_dir.display()))?;
        fs::create_dir_all(self.output_dir.join("diagrams"))?;

        for run_report in &report.runs {
            self.export_run(run_report)?;
            self.export_diagrams(run_report)?;
        }

        let summary = SummaryDocument {
            started_at: report.started_at,
            completed_at: report.completed_at,
            runs: report.runs.len(),
            completed: report.completed_runs(),
            failed: report.failed_runs(),
        };
        write_json(&self.output_dir.join("summary.json"), &summary)?;

        info!(
            output_dir = %self.output_dir.display(),
            runs = report.runs.len(),
            "experiment results exported"
        );
        Ok(())
    }

    fn export_run(&self, report: &RunReport) -> Result<()> {
        let run = &report.run;
        let image_dir = self.output_dir.join("images").join(run.id.to_string());

        let mut invocations = Vec::with_capacity(run.invocations.len());
        for invocation in &run.invocations {
            let image_file = match invocation.modality() {
                OutputModality::Text => None,
                OutputModality::Image => self.save_image(invocation, &image_dir),
            };
            invocations.push(InvocationDocument {
                id: invocation.id,
                model: invocation.model.clone(),
                sequence_number: invocation.sequence_number,
                modality: invocation.modality(),
                duration_secs: invocation.duration(),
                output_text: invocation.output.as_text().map(str::to_string),
                image_file,
            });
        }

        let trajectories = report
            .embeddings
            .iter()
            .map(|(model, embeddings)| {
                let vectors: Vec<Vec<f32>> =
                    embeddings.iter().map(|e| e.vector.clone()).collect();
                let document = TrajectoryDocument {
                    embedding_model: model.clone(),
                    dimension: vectors.first().map_or(0, Vec::len),
                    vectors,
                    semantic_drift: report.drift.get(model).cloned().unwrap_or_default(),
                };
                (model.clone(), document)
            })
            .collect();

        let document = RunDocument {
            run_id: run.id,
            network: run.network.models().to_vec(),
            seed: run.seed,
            initial_prompt: run.initial_prompt.clone(),
            max_length: run.max_length,
            state: report.state,
            stop_reason: run.stop_reason,
            error: report.error.clone(),
            invocations,
            trajectories,
        };
        write_json(
            &self.output_dir.join("runs").join(format!("{}.json", run.id)),
            &document,
        )
    }

    fn export_diagrams(&self, report: &RunReport) -> Result<()> {
        for (model, diagram) in &report.diagrams {
            let path = self
                .output_dir
                .join("diagrams")
                .join(format!("{}-{model}.json", report.run.id));
            write_json(&path, diagram)?;
        }
        Ok(())
    }

    fn save_image(&self, invocation: &Invocation, image_dir: &Path) -> Option<String> {
        let bytes = invocation.output.as_image()?;
        let decoded = match image::load_from_memory(bytes) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(
                    invocation_id = %invocation.id,
                    error = %err,
                    "skipping undecodable image output"
                );
                return None;
            }
        };

        if let Err(err) = fs::create_dir_all(image_dir) {
            warn!(error = %err, "failed to create image directory");
            return None;
        }
        let file_name = format!("{:04}.png", invocation.sequence_number);
        let path = image_dir.join(&file_name);
        match decoded.save(&path) {
            Ok(()) => Some(format!(
                "images/{}/{file_name}",
                invocation.run_id
            )),
            Err(err) => {
                warn!(invocation_id = %invocation.id, error = %err, "failed to save image");
                None
            }
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}
