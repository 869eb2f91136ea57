//! Trajectory stepping: produce the next invocation of a run.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{Invocation, ModelOutput, Run};
use crate::services::registry::{GenerativeHandle, ModelRegistry};

/// Produces the next invocation for a run: selects the model cyclically,
/// resolves the input, invokes the generator, and records timing.
///
/// A failed or mistyped generator call is fatal to the run; no partial
/// invocation is ever produced.
pub struct TrajectoryStepper {
    registry: Arc<ModelRegistry>,
    step_timeout: Option<Duration>,
}

impl TrajectoryStepper {
    pub fn new(registry: Arc<ModelRegistry>, step_timeout: Option<Duration>) -> Self {
        Self {
            registry,
            step_timeout,
        }
    }

    /// Run one step: the invocation after `previous` (or the first, if none).
    ///
    /// Input rule: the run's initial prompt at sequence 0, otherwise the
    /// previous invocation's output.
    pub async fn step(&self, run: &Run, previous: Option<&Invocation>) -> EngineResult<Invocation> {
        let sequence_number = previous.map_or(0, |p| p.sequence_number + 1);
        let model_name = run.model_at(sequence_number);
        let handle = self.registry.generative(model_name)?;

        let input = match previous {
            None => ModelOutput::text(run.initial_prompt.clone()),
            Some(p) => p.output.clone(),
        };

        debug!(
            run_id = %run.id,
            sequence_number,
            model = model_name,
            "invoking generative model"
        );

        let started_at = Utc::now();
        let output = self
            .invoke(&handle, &input, run.seed, run.id, sequence_number)
            .await?;
        let completed_at = Utc::now();

        if output.modality() != handle.modality() {
            return Err(EngineError::Generation {
                run_id: run.id,
                sequence_number,
                model: model_name.to_string(),
                message: format!(
                    "expected {} output, got {}",
                    handle.modality(),
                    output.modality()
                ),
            });
        }

        Ok(Invocation {
            id: Uuid::new_v4(),
            run_id: run.id,
            model: model_name.to_string(),
            sequence_number,
            seed: run.seed,
            output,
            started_at,
            completed_at,
        })
    }

    async fn invoke(
        &self,
        handle: &GenerativeHandle,
        input: &ModelOutput,
        seed: u64,
        run_id: Uuid,
        sequence_number: usize,
    ) -> EngineResult<ModelOutput> {
        let call = handle.generate(input, seed);
        let result = match self.step_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, call).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(EngineError::Generation {
                        run_id,
                        sequence_number,
                        model: handle.name().to_string(),
                        message: format!("timed out after {:.1}s", timeout.as_secs_f64()),
                    })
                }
            },
            None => call.await,
        };

        result.map_err(|err| EngineError::Generation {
            run_id,
            sequence_number,
            model: handle.name().to_string(),
            message: err.to_string(),
        })
    }
}
