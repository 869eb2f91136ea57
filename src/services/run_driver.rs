//! Run driver: the per-run state machine.
//!
//! The driver advances one run through `Pending -> Running -> Completed |
//! Failed`, alternating the stepper and the cycle detector, and emits each
//! invocation over an ordered bounded channel as it completes. The channel
//! is the cancellation point: a consumer that drops its receiver stops the
//! producer without affecting invocations already produced. The sequence is
//! not restartable.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::errors::EngineError;
use crate::domain::models::{Invocation, Run, RunState};
use crate::services::content_hash::output_hash;
use crate::services::cycle_detector::{CycleDetector, StepDecision};
use crate::services::registry::ModelRegistry;
use crate::services::stepper::TrajectoryStepper;

/// Invocations buffered between producer and consumer before backpressure.
const INVOCATION_CHANNEL_CAPACITY: usize = 64;

/// Terminal result of driving one run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The run reached a stop reason (length exhausted or duplicate).
    Completed(Run),
    /// A generator call failed; invocations recorded so far are kept.
    Failed { run: Run, error: EngineError },
    /// The consumer dropped its receiver before the run finished; the run
    /// stopped advancing with no stop reason recorded.
    Abandoned(Run),
}

impl RunOutcome {
    pub fn run(&self) -> &Run {
        match self {
            Self::Completed(run) | Self::Abandoned(run) => run,
            Self::Failed { run, .. } => run,
        }
    }

    pub fn into_run(self) -> Run {
        match self {
            Self::Completed(run) | Self::Abandoned(run) => run,
            Self::Failed { run, .. } => run,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// A spawned run: its ordered invocation stream and pending outcome.
pub struct RunStream {
    /// Invocations in strictly increasing sequence order. Dropping this
    /// receiver cancels the run after its in-flight step.
    pub invocations: mpsc::Receiver<Invocation>,
    /// Resolves once the run reaches a terminal state.
    pub outcome: JoinHandle<RunOutcome>,
}

/// Drives runs to a terminal state, one instance shared across runs.
///
/// Cycle-detection state is never shared: each run gets its own
/// [`CycleDetector`], created when driving starts.
#[derive(Clone)]
pub struct RunDriver {
    stepper: Arc<TrajectoryStepper>,
}

impl RunDriver {
    pub fn new(registry: Arc<ModelRegistry>, step_timeout: Option<Duration>) -> Self {
        Self {
            stepper: Arc::new(TrajectoryStepper::new(registry, step_timeout)),
        }
    }

    /// Spawn a run onto the runtime, returning its stream and outcome.
    pub fn spawn(&self, run: Run) -> RunStream {
        let (tx, rx) = mpsc::channel(INVOCATION_CHANNEL_CAPACITY);
        let driver = self.clone();
        let outcome = tokio::spawn(async move { driver.drive(run, tx).await });
        RunStream {
            invocations: rx,
            outcome,
        }
    }

    /// Drive `run` to a terminal state, emitting invocations on `events`.
    pub async fn drive(&self, mut run: Run, events: mpsc::Sender<Invocation>) -> RunOutcome {
        let mut detector = CycleDetector::new(run.max_length);
        debug!(run_id = %run.id, network = %run.network, state = %RunState::Running, "run started");

        loop {
            let invocation = match self.stepper.step(&run, run.last_invocation()).await {
                Ok(invocation) => invocation,
                Err(error) => {
                    warn!(run_id = %run.id, state = %RunState::Failed, error = %error, "run failed");
                    return RunOutcome::Failed { run, error };
                }
            };

            let decision = detector.observe(
                invocation.sequence_number,
                &output_hash(&invocation.output),
            );

            let emitted = events.send(invocation.clone()).await;
            run.invocations.push(invocation);

            match decision {
                StepDecision::Continue => {
                    if emitted.is_err() {
                        debug!(run_id = %run.id, "consumer hung up, abandoning run");
                        return RunOutcome::Abandoned(run);
                    }
                }
                StepDecision::Stop(reason) => {
                    run.stop_reason = Some(reason);
                    info!(
                        run_id = %run.id,
                        state = %RunState::Completed,
                        stop_reason = %reason,
                        invocations = run.invocations.len(),
                        "run completed"
                    );
                    return RunOutcome::Completed(run);
                }
            }
        }
    }
}
