//! Property tests for run invariants and entropy.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use proptest::prelude::*;

use trajectory_tracer::domain::models::{
    Generator, ModelOutput, Network, OutputModality, Run, StopReason,
};
use trajectory_tracer::domain::ports::GenerativeModel;
use trajectory_tracer::services::persistence_entropy;
use trajectory_tracer::services::run_driver::{RunDriver, RunOutcome};
use trajectory_tracer::services::ModelRegistry;

/// Replays a scripted list of outputs in call order.
struct ScriptedModel {
    outputs: Vec<String>,
    calls: AtomicUsize,
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn modality(&self) -> OutputModality {
        OutputModality::Text
    }

    async fn generate(&self, _input: &ModelOutput, _seed: u64) -> Result<ModelOutput> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ModelOutput::text(
            self.outputs[call % self.outputs.len()].clone(),
        ))
    }
}

fn drive_scripted(outputs: Vec<String>, max_length: usize) -> Run {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime");

    runtime.block_on(async move {
        let mut registry = ModelRegistry::new();
        registry.register_generative(
            Arc::new(ScriptedModel {
                outputs,
                calls: AtomicUsize::new(0),
            }),
            1,
        );
        let driver = RunDriver::new(Arc::new(registry), None);
        let network = Network::new(vec!["scripted".to_string()]).unwrap();
        let run = Run::new(network, 1, "prompt", max_length).unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::channel(max_length);
        let consume = tokio::spawn(async move {
            let mut count = 0usize;
            while rx.recv().await.is_some() {
                count += 1;
            }
            count
        });
        let outcome = driver.drive(run, tx).await;
        let streamed = consume.await.expect("consumer panicked");
        assert_eq!(streamed, outcome.run().invocations.len());

        match outcome {
            RunOutcome::Completed(run) => run,
            other => panic!("scripted run cannot fail: {other:?}"),
        }
    })
}

proptest! {
    /// Property: for every run, at most max_length invocations, gapless
    /// sequence numbers, and a stop reason consistent with the outputs.
    #[test]
    fn prop_run_invariants_hold_for_arbitrary_output_scripts(
        outputs in proptest::collection::vec("[a-d]", 1..24),
        max_length in 1usize..16,
    ) {
        let run = drive_scripted(outputs, max_length);

        prop_assert!(run.invocations.len() <= max_length);
        for (expected, invocation) in run.invocations.iter().enumerate() {
            prop_assert_eq!(invocation.sequence_number, expected);
        }

        let texts: Vec<&str> = run
            .invocations
            .iter()
            .map(|inv| inv.output.as_text().expect("text network"))
            .collect();
        match run.stop_reason {
            Some(StopReason::Duplicate { loop_length }) => {
                // The final output first appeared loop_length steps earlier,
                // and everything before the repeat is distinct.
                let last = texts.len() - 1;
                prop_assert!(loop_length >= 1);
                prop_assert_eq!(texts[last], texts[last - loop_length]);
                let prefix: HashSet<&str> = texts[..last].iter().copied().collect();
                prop_assert_eq!(prefix.len(), last);
            }
            Some(StopReason::LengthExhausted) => {
                prop_assert_eq!(run.invocations.len(), max_length);
                let unique: HashSet<&str> = texts.iter().copied().collect();
                prop_assert_eq!(unique.len(), texts.len());
            }
            None => prop_assert!(false, "completed run without stop reason"),
        }
    }

    /// Property: entropy is non-negative, bounded by ln(n), and zero for a
    /// single generator.
    #[test]
    fn prop_entropy_bounds(
        persistences in proptest::collection::vec(0.01f64..100.0, 1..12),
    ) {
        let generators: Vec<Generator> = persistences
            .iter()
            .map(|&p| Generator::new(0.0, p))
            .collect();

        let entropy = persistence_entropy(&generators).expect("entropy must be defined");
        prop_assert!(entropy >= -1e-12);
        prop_assert!(entropy <= (generators.len() as f64).ln() + 1e-9);
        if generators.len() == 1 {
            prop_assert!(entropy.abs() < 1e-12);
        }
    }

    /// Property: scaling all persistences leaves the entropy unchanged.
    #[test]
    fn prop_entropy_is_scale_invariant(
        persistences in proptest::collection::vec(0.01f64..10.0, 1..8),
        scale in 0.1f64..50.0,
    ) {
        let original: Vec<Generator> = persistences
            .iter()
            .map(|&p| Generator::new(0.0, p))
            .collect();
        let scaled: Vec<Generator> = persistences
            .iter()
            .map(|&p| Generator::new(0.0, p * scale))
            .collect();

        let a = persistence_entropy(&original).expect("entropy must be defined");
        let b = persistence_entropy(&scaled).expect("entropy must be defined");
        prop_assert!((a - b).abs() < 1e-9);
    }
}
