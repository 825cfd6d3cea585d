use log::debug;

use weave_trace::{Decision, LowLevelTrace, Operation, TracePair};

use super::{position_by_id, ExplorationStrategy, IterationLifecycle, RandomStrategy};
use crate::search::SearchState;

/// Replays a fixed low-level decision prefix, then explores randomly.
///
/// Each query consumes the decision at the cursor. The first decision that
/// does not fit the query (wrong kind, operation not ready, integer out of
/// range) ends the replay for the rest of the iteration. Every iteration
/// starts replaying from the top again.
pub struct ReplayStrategy {
    prefix: LowLevelTrace,
    cursor: usize,
    diverged: bool,
    fallback: RandomStrategy,
}

impl ReplayStrategy {
    pub fn new(prefix: LowLevelTrace, fallback: RandomStrategy) -> Self {
        Self {
            prefix,
            cursor: 0,
            diverged: false,
            fallback,
        }
    }

    /// `true` while decisions are still taken from the prefix.
    pub fn is_replaying(&self) -> bool {
        !self.diverged && self.cursor < self.prefix.len()
    }

    pub fn diverged(&self) -> bool {
        self.diverged
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn take(&mut self) -> Option<Decision> {
        if !self.is_replaying() {
            return None;
        }
        let decision = self.prefix.get(self.cursor).cloned();
        self.cursor += 1;
        decision
    }

    fn diverge(&mut self, query: &str) {
        debug!(
            "replay diverged at decision {} on {query}, continuing randomly",
            self.cursor.saturating_sub(1)
        );
        self.diverged = true;
    }
}

impl IterationLifecycle for ReplayStrategy {
    fn initialize_iteration(
        &mut self,
        _iteration: u32,
        _previous: Option<&TracePair>,
        _search: &mut SearchState,
    ) -> bool {
        self.cursor = 0;
        self.diverged = false;
        true
    }
}

impl ExplorationStrategy for ReplayStrategy {
    fn next_operation<'a>(
        &mut self,
        ready: &'a [Operation],
        current: Option<&Operation>,
        is_yielding: bool,
    ) -> &'a Operation {
        if let Some(decision) = self.take() {
            let pos = decision
                .scheduled_operation()
                .and_then(|id| position_by_id(ready, id));
            match pos {
                Some(idx) => return &ready[idx],
                None => self.diverge("next_operation"),
            }
        }
        self.fallback.next_operation(ready, current, is_yielding)
    }

    fn next_boolean(&mut self, current: Option<&Operation>) -> bool {
        if let Some(decision) = self.take() {
            match decision.boolean_choice() {
                Some(value) => return value,
                None => self.diverge("next_boolean"),
            }
        }
        self.fallback.next_boolean(current)
    }

    fn next_integer(&mut self, current: Option<&Operation>, bound: i64) -> i64 {
        if let Some(decision) = self.take() {
            match decision.integer_choice() {
                Some(value) if (0..bound).contains(&value) => return value,
                _ => self.diverge("next_integer"),
            }
        }
        self.fallback.next_integer(current, bound)
    }

    fn name(&self) -> &str {
        "replay"
    }

    fn description(&self) -> String {
        format!("replay[{} decisions]", self.prefix.len())
    }
}
