use std::fmt;

use log::{debug, info, log_enabled, Level};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use weave_mutate::Mutator;
use weave_oracle::StateOracle;
use weave_trace::{Operation, TraceCandidate, TracePair};

use crate::rng::{stage_rng, FALLBACK_STAGE, MUTATION_STAGE};
use crate::search::SearchState;
use crate::strategy::{position_by_name, ExplorationStrategy, IterationLifecycle, RandomStrategy};

/// How many mutants each unit of novelty is worth. Both variants replay a
/// candidate the same way: high-level steps by operation name, boolean
/// choices cycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerVariant {
    /// One mutant per unit of novelty.
    Interleaved,
    /// Five mutants per unit of novelty; reports its random iterations.
    RoundRobin,
}

impl ControllerVariant {
    /// Mutants spawned per unit of novelty.
    pub fn multiplier(&self) -> usize {
        match self {
            ControllerVariant::Interleaved => 1,
            ControllerVariant::RoundRobin => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ControllerVariant::Interleaved => "interleaved_fuzzing",
            ControllerVariant::RoundRobin => "round_robin_fuzzing",
        }
    }
}

/// Which novelty signal drives mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Score states for the history, never mutate or replay.
    Disabled,
    /// Novelty = number of previously unseen oracle state keys.
    #[default]
    StateNovelty,
    /// Novelty = 1 when the high-level trace signature is unseen.
    TraceNovelty,
}

impl RunMode {
    /// Configuration code: `0` disabled, `1` state novelty, `2` trace novelty.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RunMode::Disabled),
            1 => Some(RunMode::StateNovelty),
            2 => Some(RunMode::TraceNovelty),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            RunMode::Disabled => 0,
            RunMode::StateNovelty => 1,
            RunMode::TraceNovelty => 2,
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunMode::Disabled => "disabled",
            RunMode::StateNovelty => "state_novelty",
            RunMode::TraceNovelty => "trace_novelty",
        };
        write!(f, "{name}")
    }
}

/// Coverage-guided strategy: scores every finished iteration with the state
/// oracle, queues mutants of novel ones, and replays one queued candidate per
/// iteration. Whenever the candidate cannot answer a query the random
/// fallback does.
///
/// Iterations run by other portfolio members reach the controller through
/// [`IterationLifecycle::observe_iteration`] and are scored the same way.
pub struct FuzzingController {
    variant: ControllerVariant,
    run_mode: RunMode,
    mutator: Box<dyn Mutator>,
    oracle: Box<dyn StateOracle>,
    mutation_rng: ChaCha8Rng,
    fallback: RandomStrategy,
    /// Candidate replayed in the current iteration.
    loaded: Option<TraceCandidate>,
    /// Where the next high-level scan starts.
    cursor: usize,
    bool_choices: Vec<bool>,
    bool_cursor: usize,
    replayed_decisions: u64,
    fallback_decisions: u64,
}

impl FuzzingController {
    pub fn new(
        variant: ControllerVariant,
        run_mode: RunMode,
        mutator: Box<dyn Mutator>,
        oracle: Box<dyn StateOracle>,
        seed: u64,
    ) -> Self {
        Self {
            variant,
            run_mode,
            mutator,
            oracle,
            mutation_rng: stage_rng(seed, MUTATION_STAGE),
            fallback: RandomStrategy::new(seed, FALLBACK_STAGE),
            loaded: None,
            cursor: 0,
            bool_choices: Vec::new(),
            bool_cursor: 0,
            replayed_decisions: 0,
            fallback_decisions: 0,
        }
    }

    pub fn variant(&self) -> ControllerVariant {
        self.variant
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    pub fn mutator_name(&self) -> &str {
        self.mutator.name()
    }

    /// The candidate being replayed this iteration, with consumed
    /// high-level steps already removed.
    pub fn loaded(&self) -> Option<&TraceCandidate> {
        self.loaded.as_ref()
    }

    pub fn is_replaying(&self) -> bool {
        self.loaded.is_some()
    }

    /// Decisions answered from a loaded candidate, over the whole search.
    pub fn replayed_decisions(&self) -> u64 {
        self.replayed_decisions
    }

    /// Decisions a loaded candidate could not answer, over the whole search.
    pub fn fallback_decisions(&self) -> u64 {
        self.fallback_decisions
    }

    fn unload(&mut self) {
        self.loaded = None;
        self.cursor = 0;
        self.bool_choices.clear();
        self.bool_cursor = 0;
    }

    fn load(&mut self, candidate: TraceCandidate) {
        self.cursor = 0;
        self.bool_cursor = 0;
        self.bool_choices = candidate.low.boolean_choices();
        debug!(
            "loaded candidate: {} steps, {} decisions",
            candidate.high.len(),
            candidate.low.len()
        );
        self.loaded = Some(candidate);
    }

    fn spawn_candidates(&mut self, source: &TracePair, count: usize, search: &mut SearchState) {
        for _ in 0..count {
            match self.mutator.mutate(source, &mut self.mutation_rng) {
                Some(candidate) => search.enqueue(candidate),
                None => search.note_mutation_failure(),
            }
        }
    }

    /// Submit a finished iteration to the oracle, record what it found and
    /// queue mutants in proportion to its novelty.
    fn score(&mut self, iteration: u32, finished: &TracePair, search: &mut SearchState) {
        let states = self.oracle.submit(&finished.high);
        let new_states = search.record_states(&states);
        search.push_history();

        let novelty = match self.run_mode {
            RunMode::Disabled => return,
            RunMode::StateNovelty => new_states,
            RunMode::TraceNovelty => usize::from(search.record_signature(finished.high.signature())),
        };
        debug!(
            "iteration {iteration}: oracle returned {} states, {new_states} new, novelty {novelty}",
            states.len()
        );
        if novelty > 0 {
            if log_enabled!(Level::Debug) {
                debug!("novel run per operation: {}", finished.high.operation_projection());
            }
            self.spawn_candidates(finished, novelty * self.variant.multiplier(), search);
        }
    }

    /// Scan the loaded high-level trace cyclically from the cursor for a step
    /// owned by a ready operation. The matched step is consumed.
    fn match_step(&mut self, ready: &[Operation]) -> Option<usize> {
        let candidate = self.loaded.as_mut()?;
        let len = candidate.high.len();
        for _ in 0..len {
            let at = self.cursor % len;
            let pos = candidate
                .high
                .get(at)
                .filter(|step| step.is_operation_step())
                .and_then(|step| step.owner())
                .and_then(|owner| position_by_name(ready, &owner.name));
            if let Some(idx) = pos {
                candidate.high.remove(at);
                self.cursor = at;
                return Some(idx);
            }
            self.cursor = at + 1;
        }
        None
    }

    fn note_fallback(&mut self, query: &str) {
        if self.loaded.is_some() {
            self.fallback_decisions += 1;
            debug!("{query}: candidate cannot answer, falling back to random");
        }
    }
}

impl IterationLifecycle for FuzzingController {
    fn initialize_iteration(
        &mut self,
        iteration: u32,
        previous: Option<&TracePair>,
        search: &mut SearchState,
    ) -> bool {
        self.unload();

        let previous = match previous {
            Some(previous) if iteration > 0 => previous,
            _ => {
                search.note_random_iteration();
                return true;
            }
        };

        self.score(iteration, previous, search);
        if self.run_mode == RunMode::Disabled {
            search.note_random_iteration();
            return true;
        }

        match search.dequeue() {
            Some(candidate) => self.load(candidate),
            None => search.note_random_iteration(),
        }
        true
    }

    fn observe_iteration(&mut self, iteration: u32, finished: &TracePair, search: &mut SearchState) {
        self.score(iteration, finished, search);
    }

    fn finalize(&mut self, search: &SearchState) -> bool {
        info!("Total states seen: {}", search.states_seen());
        info!("Total traces seen: {}", search.traces_seen());
        if self.variant == ControllerVariant::RoundRobin {
            info!("Number of random schedules: {}", search.random_iterations());
        }
        true
    }
}

impl ExplorationStrategy for FuzzingController {
    fn next_operation<'a>(
        &mut self,
        ready: &'a [Operation],
        current: Option<&Operation>,
        is_yielding: bool,
    ) -> &'a Operation {
        if let Some(idx) = self.match_step(ready) {
            self.replayed_decisions += 1;
            return &ready[idx];
        }
        self.note_fallback("next_operation");
        self.fallback.next_operation(ready, current, is_yielding)
    }

    fn next_boolean(&mut self, current: Option<&Operation>) -> bool {
        if !self.bool_choices.is_empty() {
            let value = self.bool_choices[self.bool_cursor];
            self.bool_cursor = (self.bool_cursor + 1) % self.bool_choices.len();
            self.replayed_decisions += 1;
            return value;
        }
        self.note_fallback("next_boolean");
        self.fallback.next_boolean(current)
    }

    fn next_integer(&mut self, current: Option<&Operation>, bound: i64) -> i64 {
        // TODO: integer choices are not replayed; the name scan only sees
        // operation steps, so it would need its own cursor over the
        // candidate's integer decisions.
        self.note_fallback("next_integer");
        self.fallback.next_integer(current, bound)
    }

    fn name(&self) -> &str {
        self.variant.name()
    }

    fn description(&self) -> String {
        let kind = match self.variant {
            ControllerVariant::Interleaved => "Fuzzing Strategy",
            ControllerVariant::RoundRobin => "Round Robin Fuzzing Strategy",
        };
        format!("{kind} [mode:{}, mutator:{}]", self.run_mode, self.mutator.name())
    }
}
