//! Exploration strategies: the "brain" answering every scheduling query.

pub mod console;
pub mod random;
pub mod replay;

use weave_trace::{Operation, TracePair};

use crate::search::SearchState;

pub use console::ConsoleStrategy;
pub use random::RandomStrategy;
pub use replay::ReplayStrategy;

/// Iteration-boundary hooks, implemented by every strategy.
///
/// Plain strategies keep the default no-op bodies.
pub trait IterationLifecycle {
    /// Prepare for `iteration`. `previous` is the recording of the iteration
    /// that just finished (absent before the first one).
    fn initialize_iteration(
        &mut self,
        _iteration: u32,
        _previous: Option<&TracePair>,
        _search: &mut SearchState,
    ) -> bool {
        true
    }

    /// An iteration finished and another strategy takes the next turn.
    /// `finished` is its recording, whoever ran it; the strategy taking the
    /// turn gets the same recording through `initialize_iteration` instead.
    fn observe_iteration(&mut self, _iteration: u32, _finished: &TracePair, _search: &mut SearchState) {}

    /// Called once at the end of the search. Returns `true` if the strategy
    /// reported anything.
    fn finalize(&mut self, _search: &SearchState) -> bool {
        false
    }
}

/// Answers the three scheduling queries issued by the harness.
pub trait ExplorationStrategy: IterationLifecycle {
    /// Pick the operation to run next. `ready` is never empty; the returned
    /// reference always points into it.
    fn next_operation<'a>(
        &mut self,
        ready: &'a [Operation],
        current: Option<&Operation>,
        is_yielding: bool,
    ) -> &'a Operation;

    fn next_boolean(&mut self, current: Option<&Operation>) -> bool;

    /// A value in `[0, bound)`; `0` when `bound <= 0`.
    fn next_integer(&mut self, current: Option<&Operation>, bound: i64) -> i64;

    /// Name of this strategy (for logs and reports).
    fn name(&self) -> &str;

    fn description(&self) -> String {
        self.name().to_string()
    }
}

impl<S: ExplorationStrategy + ?Sized> IterationLifecycle for Box<S> {
    fn initialize_iteration(
        &mut self,
        iteration: u32,
        previous: Option<&TracePair>,
        search: &mut SearchState,
    ) -> bool {
        (**self).initialize_iteration(iteration, previous, search)
    }

    fn observe_iteration(&mut self, iteration: u32, finished: &TracePair, search: &mut SearchState) {
        (**self).observe_iteration(iteration, finished, search)
    }

    fn finalize(&mut self, search: &SearchState) -> bool {
        (**self).finalize(search)
    }
}

impl<S: ExplorationStrategy + ?Sized> ExplorationStrategy for Box<S> {
    fn next_operation<'a>(
        &mut self,
        ready: &'a [Operation],
        current: Option<&Operation>,
        is_yielding: bool,
    ) -> &'a Operation {
        (**self).next_operation(ready, current, is_yielding)
    }

    fn next_boolean(&mut self, current: Option<&Operation>) -> bool {
        (**self).next_boolean(current)
    }

    fn next_integer(&mut self, current: Option<&Operation>, bound: i64) -> i64 {
        (**self).next_integer(current, bound)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn description(&self) -> String {
        (**self).description()
    }
}

/// Position of the ready operation with id `id`.
pub(crate) fn position_by_id(ready: &[Operation], id: u64) -> Option<usize> {
    ready.iter().position(|op| op.id == id)
}

/// Position of the ready operation named `name`.
pub(crate) fn position_by_name(ready: &[Operation], name: &str) -> Option<usize> {
    ready.iter().position(|op| op.name == name)
}
