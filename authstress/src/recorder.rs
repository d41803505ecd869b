//! Concurrent collection of request outcomes
use authstress_core::{AggregateResult, RequestOutcome};
use metrics_util::AtomicBucket;
use std::sync::Arc;

/// Accumulates the outcomes of one scenario run.
///
/// Clones share the same collection, so a clone can be moved into every in-flight request. Appends
/// are lock-free; [`Recorder::snapshot`] reads whatever has been recorded so far and never blocks
/// writers.
#[derive(Clone)]
pub struct Recorder {
    outcomes: Arc<AtomicBucket<RequestOutcome>>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(AtomicBucket::new()),
        }
    }

    pub fn record(&self, outcome: RequestOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn snapshot(&self) -> AggregateResult {
        AggregateResult::from_outcomes(&self.outcomes.data())
    }

    pub fn len(&self) -> usize {
        let mut len = 0;
        self.outcomes.data_with(|block| len += block.len());
        len
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Every recorded outcome, ordered by sequence index.
    pub fn outcomes(&self) -> Vec<RequestOutcome> {
        let mut outcomes = self.outcomes.data();
        outcomes.sort_by_key(|outcome| outcome.sequence_index);
        outcomes
    }
}
