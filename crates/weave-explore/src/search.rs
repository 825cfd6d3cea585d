//! Search-wide state shared by every iteration of one search.
//!
//! Owned by the scheduler and handed to the active strategy by exclusive
//! reference at iteration boundaries. Nothing here is global.

use std::collections::{BTreeSet, VecDeque};

use weave_trace::{AbstractState, TraceCandidate};

/// Queue, novelty sets and counters for one search.
#[derive(Debug, Clone)]
pub struct SearchState {
    /// Mutated candidates, drained in insertion order.
    queue: VecDeque<TraceCandidate>,
    seen_states: BTreeSet<i64>,
    seen_signatures: BTreeSet<String>,
    /// Distinct states seen after each scored iteration; starts at `[0]`.
    state_history: Vec<usize>,
    /// Renderings of newly discovered states, in discovery order.
    discovered_states: Vec<String>,
    iterations: u64,
    random_iterations: u64,
    candidates_enqueued: u64,
    mutation_failures: u64,
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            seen_states: BTreeSet::new(),
            seen_signatures: BTreeSet::new(),
            state_history: vec![0],
            discovered_states: Vec::new(),
            iterations: 0,
            random_iterations: 0,
            candidates_enqueued: 0,
            mutation_failures: 0,
        }
    }

    /// Record oracle states, returning how many keys were new.
    pub fn record_states(&mut self, states: &[AbstractState]) -> usize {
        let mut fresh = 0;
        for state in states {
            if self.seen_states.insert(state.key) {
                fresh += 1;
                self.discovered_states.push(state.text.clone());
            }
        }
        fresh
    }

    /// Record a trace signature, returning `true` if it was unseen.
    pub fn record_signature(&mut self, signature: String) -> bool {
        self.seen_signatures.insert(signature)
    }

    /// Append the current distinct-state count to the history.
    pub fn push_history(&mut self) {
        self.state_history.push(self.seen_states.len());
    }

    pub fn enqueue(&mut self, candidate: TraceCandidate) {
        self.candidates_enqueued += 1;
        self.queue.push_back(candidate);
    }

    pub fn dequeue(&mut self) -> Option<TraceCandidate> {
        self.queue.pop_front()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn note_iteration(&mut self) {
        self.iterations += 1;
    }

    pub fn note_random_iteration(&mut self) {
        self.random_iterations += 1;
    }

    pub fn note_mutation_failure(&mut self) {
        self.mutation_failures += 1;
    }

    pub fn states_seen(&self) -> usize {
        self.seen_states.len()
    }

    pub fn traces_seen(&self) -> usize {
        self.seen_signatures.len()
    }

    pub fn has_seen_state(&self, key: i64) -> bool {
        self.seen_states.contains(&key)
    }

    pub fn state_history(&self) -> &[usize] {
        &self.state_history
    }

    pub fn discovered_states(&self) -> &[String] {
        &self.discovered_states
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn random_iterations(&self) -> u64 {
        self.random_iterations
    }

    /// Total candidates ever enqueued, including ones already consumed.
    pub fn candidates_enqueued(&self) -> u64 {
        self.candidates_enqueued
    }

    pub fn mutation_failures(&self) -> u64 {
        self.mutation_failures
    }
}
