//! Duplicate/cycle detection for one run.
//!
//! The detector owns the map of output hashes seen so far in a single run,
//! keyed to the sequence number of first observation. One instance per run,
//! owned by the driver, never shared across runs.

use std::collections::HashMap;

use crate::domain::models::StopReason;

/// Decision after observing one invocation's output hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDecision {
    /// The run may advance to the next step.
    Continue,
    /// The run is done; record the reason and stop.
    Stop(StopReason),
}

/// Per-run cycle detector over exact content-hash equality.
#[derive(Debug)]
pub struct CycleDetector {
    max_length: usize,
    first_seen: HashMap<String, usize>,
}

impl CycleDetector {
    /// Create a detector for a run bounded at `max_length` invocations.
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            first_seen: HashMap::new(),
        }
    }

    /// Observe the output hash of the invocation at `sequence_number`.
    ///
    /// A hash already recorded at `first_seq` stops the run with
    /// `Duplicate { loop_length: sequence_number - first_seq }`; comparison
    /// is against every prior output, so cycles of arbitrary period are
    /// caught, not only immediate repetition. Otherwise the hash is
    /// recorded, and reaching the final allowed step stops the run with
    /// `LengthExhausted`. Duplicate detection takes priority when both
    /// apply at the final step.
    pub fn observe(&mut self, sequence_number: usize, output_hash: &str) -> StepDecision {
        if let Some(&first_seq) = self.first_seen.get(output_hash) {
            return StepDecision::Stop(StopReason::Duplicate {
                loop_length: sequence_number - first_seq,
            });
        }
        self.first_seen.insert(output_hash.to_string(), sequence_number);

        if sequence_number == self.max_length - 1 {
            return StepDecision::Stop(StopReason::LengthExhausted);
        }
        StepDecision::Continue
    }

    /// Number of distinct hashes observed so far.
    pub fn seen_count(&self) -> usize {
        self.first_seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continues_on_fresh_hashes() {
        let mut detector = CycleDetector::new(5);
        assert_eq!(detector.observe(0, "h0"), StepDecision::Continue);
        assert_eq!(detector.observe(1, "h1"), StepDecision::Continue);
        assert_eq!(detector.seen_count(), 2);
    }

    #[test]
    fn immediate_repeat_is_loop_length_one() {
        let mut detector = CycleDetector::new(5);
        detector.observe(0, "h0");
        assert_eq!(
            detector.observe(1, "h0"),
            StepDecision::Stop(StopReason::Duplicate { loop_length: 1 })
        );
    }

    #[test]
    fn detects_arbitrary_period() {
        let mut detector = CycleDetector::new(10);
        detector.observe(0, "h0");
        detector.observe(1, "h1");
        detector.observe(2, "h2");
        assert_eq!(
            detector.observe(3, "h0"),
            StepDecision::Stop(StopReason::Duplicate { loop_length: 3 })
        );
    }

    #[test]
    fn stops_at_length_bound() {
        let mut detector = CycleDetector::new(3);
        assert_eq!(detector.observe(0, "h0"), StepDecision::Continue);
        assert_eq!(detector.observe(1, "h1"), StepDecision::Continue);
        assert_eq!(
            detector.observe(2, "h2"),
            StepDecision::Stop(StopReason::LengthExhausted)
        );
    }

    #[test]
    fn duplicate_wins_over_exhaustion_at_final_step() {
        let mut detector = CycleDetector::new(2);
        detector.observe(0, "h0");
        assert_eq!(
            detector.observe(1, "h0"),
            StepDecision::Stop(StopReason::Duplicate { loop_length: 1 })
        );
    }

    #[test]
    fn single_step_run_exhausts_immediately() {
        let mut detector = CycleDetector::new(1);
        assert_eq!(
            detector.observe(0, "h0"),
            StepDecision::Stop(StopReason::LengthExhausted)
        );
    }
}
