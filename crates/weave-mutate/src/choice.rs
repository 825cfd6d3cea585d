use rand::seq::SliceRandom;
use rand::RngCore;

use weave_trace::{Decision, LowLevelTrace, TraceCandidate, TracePair};

use crate::Mutator;

/// Invert one uniformly chosen boolean decision in place.
///
/// Returns the flipped position, or `None` when the trace has no boolean
/// decision.
pub fn flip_one_boolean(low: &mut LowLevelTrace, rng: &mut dyn RngCore) -> Option<usize> {
    let positions = low.boolean_positions();
    let &index = positions.choose(rng)?;
    let value = low.get(index)?.boolean_choice()?;
    low.set(index, Decision::boolean(!value));
    Some(index)
}

/// Flips exactly one boolean nondeterministic choice in the low-level trace.
/// The high-level trace is carried over untouched.
#[derive(Debug, Clone, Default)]
pub struct FlipOneBooleanChoiceMutator;

impl FlipOneBooleanChoiceMutator {
    pub fn new() -> Self {
        Self
    }
}

impl Mutator for FlipOneBooleanChoiceMutator {
    fn mutate(&self, source: &TracePair, rng: &mut dyn RngCore) -> Option<TraceCandidate> {
        let mut low = source.low.clone();
        flip_one_boolean(&mut low, rng)?;
        Some(TracePair::new(source.high.clone(), low))
    }

    fn name(&self) -> &str {
        "choice"
    }
}
