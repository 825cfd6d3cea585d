use log::debug;
use rand::seq::SliceRandom;
use rand::RngCore;

use weave_trace::{HighLevelTrace, Step, TraceCandidate, TracePair};

use crate::choice::flip_one_boolean;
use crate::Mutator;

/// Re-places synthetic delays in the high-level trace, then flips one boolean
/// choice in the low-level trace.
///
/// Existing delays are removed first, so repeated mutation never accumulates
/// more than `delays` of them.
#[derive(Debug, Clone)]
pub struct InsertDelaysAndFlipMutator {
    delays: u32,
}

impl InsertDelaysAndFlipMutator {
    pub fn new(delays: u32) -> Self {
        Self { delays }
    }

    pub fn delays(&self) -> u32 {
        self.delays
    }

    /// Insert up to `self.delays` delay steps, each immediately before a
    /// send or invoked-action step. Returns how many were inserted.
    fn insert_delays(&self, high: &mut HighLevelTrace, rng: &mut dyn RngCore) -> u32 {
        high.retain(|s| !s.is_delay());

        let mut inserted = 0;
        for _ in 0..self.delays {
            let targets: Vec<usize> = high
                .iter()
                .enumerate()
                .filter(|(_, s)| s.accepts_delay())
                .map(|(i, _)| i)
                .collect();
            let Some(&index) = targets.choose(rng) else {
                break;
            };
            high.insert(index, Step::Delay);
            inserted += 1;
        }
        inserted
    }
}

impl Mutator for InsertDelaysAndFlipMutator {
    fn mutate(&self, source: &TracePair, rng: &mut dyn RngCore) -> Option<TraceCandidate> {
        let mut high = source.high.clone();
        let mut low = source.low.clone();

        let inserted = self.insert_delays(&mut high, rng);
        let flipped = flip_one_boolean(&mut low, rng);

        if inserted == 0 && flipped.is_none() {
            debug!("delay mutator: no send/action position and no boolean choice");
            return None;
        }
        Some(TracePair::new(high, low))
    }

    fn name(&self) -> &str {
        "delay"
    }
}
