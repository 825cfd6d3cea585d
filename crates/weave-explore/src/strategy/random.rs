use rand::Rng;
use rand_chacha::ChaCha8Rng;

use weave_trace::Operation;

use super::{ExplorationStrategy, IterationLifecycle};
use crate::rng::stage_rng;

/// Seeded uniform random strategy, the default and the fallback of every
/// replaying strategy.
///
/// Stateless across calls apart from the random source; fairness is up to
/// the harness.
pub struct RandomStrategy {
    rng: ChaCha8Rng,
    seed: u64,
}

impl RandomStrategy {
    pub fn new(seed: u64, stage_id: u64) -> Self {
        Self {
            rng: stage_rng(seed, stage_id),
            seed: seed.wrapping_add(stage_id),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl IterationLifecycle for RandomStrategy {}

impl ExplorationStrategy for RandomStrategy {
    fn next_operation<'a>(
        &mut self,
        ready: &'a [Operation],
        _current: Option<&Operation>,
        _is_yielding: bool,
    ) -> &'a Operation {
        assert!(!ready.is_empty(), "next_operation called with an empty ready set");
        &ready[self.rng.gen_range(0..ready.len())]
    }

    fn next_boolean(&mut self, _current: Option<&Operation>) -> bool {
        self.rng.gen()
    }

    fn next_integer(&mut self, _current: Option<&Operation>, bound: i64) -> i64 {
        if bound <= 0 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }

    fn name(&self) -> &str {
        "random"
    }

    fn description(&self) -> String {
        format!("random[seed:{}]", self.seed)
    }
}
