use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use weave_trace::{TraceCandidate, TracePair};

use crate::Mutator;

/// Swaps two operation steps (send, receive, invoked action) owned by
/// different operations in the high-level trace. The low-level trace is
/// carried over untouched.
#[derive(Debug, Clone, Default)]
pub struct SwapOperationStepsMutator;

impl SwapOperationStepsMutator {
    pub fn new() -> Self {
        Self
    }
}

impl Mutator for SwapOperationStepsMutator {
    fn mutate(&self, source: &TracePair, rng: &mut dyn RngCore) -> Option<TraceCandidate> {
        // (position, owner id) of every swappable step
        let eligible: Vec<(usize, u64)> = source
            .high
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_operation_step())
            .filter_map(|(i, s)| s.owner().map(|op| (i, op.id)))
            .collect();

        let &(first, first_owner) = eligible.choose(rng)?;
        let partners: Vec<usize> = eligible
            .iter()
            .filter(|(_, owner)| *owner != first_owner)
            .map(|(i, _)| *i)
            .collect();
        // Single-operation trace: nothing to swap.
        let &second = partners.choose(rng)?;

        let mut high = source.high.clone();
        high.swap(first, second);
        Some(TracePair::new(high, source.low.clone()))
    }

    fn name(&self) -> &str {
        "actor"
    }
}

/// Swaps two distinct positions of the low-level trace regardless of
/// decision kind. The high-level trace is carried over untouched.
#[derive(Debug, Clone, Default)]
pub struct SwapLowLevelDecisionsMutator;

impl SwapLowLevelDecisionsMutator {
    pub fn new() -> Self {
        Self
    }
}

impl Mutator for SwapLowLevelDecisionsMutator {
    fn mutate(&self, source: &TracePair, rng: &mut dyn RngCore) -> Option<TraceCandidate> {
        let len = source.low.len();
        if len < 2 {
            return None;
        }

        let one = rng.gen_range(0..len);
        // Draw from the remaining len - 1 slots so the two never coincide.
        let mut two = rng.gen_range(0..len - 1);
        if two >= one {
            two += 1;
        }

        let mut low = source.low.clone();
        low.swap(one, two);
        Some(TracePair::new(source.high.clone(), low))
    }

    fn name(&self) -> &str {
        "process"
    }
}
