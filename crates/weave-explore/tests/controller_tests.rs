use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use weave_explore::{
    ControllerVariant, ExplorationStrategy, FuzzingController, IterationLifecycle, RunMode,
    SearchState,
};
use weave_mutate::{Mutator, NoOpMutator, SwapOperationStepsMutator};
use weave_oracle::StateOracle;
use weave_trace::{
    AbstractState, Decision, EventDescriptor, HighLevelTrace, LowLevelTrace, Operation,
    OperationRef, Step, TraceCandidate, TracePair,
};

/// Always answers with the same keys, whatever the trace.
struct FixedOracle {
    keys: Vec<i64>,
}

impl StateOracle for FixedOracle {
    fn submit(&mut self, _trace: &HighLevelTrace) -> Vec<AbstractState> {
        self.keys
            .iter()
            .map(|k| AbstractState::new(*k, format!("state {k}")))
            .collect()
    }
}

/// Answers every submission with `per_call` keys never returned before.
struct FreshOracle {
    next: i64,
    per_call: usize,
}

impl StateOracle for FreshOracle {
    fn submit(&mut self, _trace: &HighLevelTrace) -> Vec<AbstractState> {
        (0..self.per_call)
            .map(|_| {
                self.next += 1;
                AbstractState::new(self.next, format!("fresh {}", self.next))
            })
            .collect()
    }
}

/// Returns the source unchanged, so the replayed candidate is predictable.
struct CloneMutator;

impl Mutator for CloneMutator {
    fn mutate(&self, source: &TracePair, _rng: &mut dyn RngCore) -> Option<TraceCandidate> {
        Some(source.clone())
    }

    fn name(&self) -> &str {
        "clone"
    }
}

fn op(id: u64, name: &str) -> OperationRef {
    OperationRef::new(id, name)
}

fn ready(ops: &[(u64, &str)]) -> Vec<Operation> {
    ops.iter().map(|(id, name)| Operation::new(*id, *name)).collect()
}

/// `[Send(A->B,"m1"), InvokedAction(B,"act1"), Send(B->A,"m2")]`
fn scenario_pair() -> TracePair {
    let a = op(1, "A");
    let b = op(2, "B");
    let high = HighLevelTrace::from(vec![
        Step::send(a.clone(), b.clone(), EventDescriptor::new("m1")),
        Step::action(b.clone(), "act1"),
        Step::send(b, a, EventDescriptor::new("m2")),
    ]);
    let low = LowLevelTrace::from(vec![
        Decision::schedule(1),
        Decision::boolean(true),
        Decision::schedule(2),
        Decision::integer(3),
        Decision::boolean(false),
    ]);
    TracePair::new(high, low)
}

fn controller(
    variant: ControllerVariant,
    mode: RunMode,
    oracle: impl StateOracle + 'static,
) -> FuzzingController {
    FuzzingController::new(variant, mode, Box::new(CloneMutator), Box::new(oracle), 42)
}

#[test]
fn test_first_iteration_runs_randomly() {
    let mut search = SearchState::new();
    let mut ctl = controller(
        ControllerVariant::Interleaved,
        RunMode::StateNovelty,
        FixedOracle { keys: vec![1] },
    );
    assert!(ctl.initialize_iteration(0, Some(&scenario_pair()), &mut search));
    assert!(!ctl.is_replaying());
    assert_eq!(search.states_seen(), 0);
    assert_eq!(search.state_history(), &[0]);
    assert_eq!(search.random_iterations(), 1);

    assert!(ctl.initialize_iteration(1, None, &mut search));
    assert!(!ctl.is_replaying());
    assert_eq!(search.random_iterations(), 2);
}

#[test]
fn test_resubmission_has_zero_novelty() {
    let mut search = SearchState::new();
    let mut ctl = controller(
        ControllerVariant::Interleaved,
        RunMode::StateNovelty,
        FixedOracle { keys: vec![1, 2] },
    );
    let pair = scenario_pair();

    ctl.initialize_iteration(1, Some(&pair), &mut search);
    assert_eq!(search.candidates_enqueued(), 2);

    ctl.initialize_iteration(2, Some(&pair), &mut search);
    assert_eq!(search.candidates_enqueued(), 2);
    assert_eq!(search.states_seen(), 2);
    assert_eq!(search.state_history(), &[0, 2, 2]);
    assert_eq!(search.discovered_states(), &["state 1", "state 2"]);
}

#[test]
fn test_interleaved_enqueues_one_candidate_per_new_state() {
    let mut search = SearchState::new();
    let mut ctl = controller(
        ControllerVariant::Interleaved,
        RunMode::StateNovelty,
        FreshOracle { next: 0, per_call: 3 },
    );
    ctl.initialize_iteration(1, Some(&scenario_pair()), &mut search);
    assert_eq!(search.candidates_enqueued(), 3);
    assert_eq!(search.queue_len(), 2);
    assert!(ctl.is_replaying());
}

#[test]
fn test_round_robin_enqueues_five_candidates_per_new_state() {
    let mut search = SearchState::new();
    let mut ctl = controller(
        ControllerVariant::RoundRobin,
        RunMode::StateNovelty,
        FreshOracle { next: 0, per_call: 3 },
    );
    ctl.initialize_iteration(1, Some(&scenario_pair()), &mut search);
    assert_eq!(search.candidates_enqueued(), 15);
    assert_eq!(search.queue_len(), 14);
}

#[test]
fn test_queue_drains_before_running_randomly() {
    let mut search = SearchState::new();
    let mut ctl = controller(
        ControllerVariant::Interleaved,
        RunMode::StateNovelty,
        FixedOracle { keys: vec![1, 2] },
    );
    let pair = scenario_pair();
    ctl.initialize_iteration(1, Some(&pair), &mut search);
    assert!(ctl.is_replaying());
    ctl.initialize_iteration(2, Some(&pair), &mut search);
    assert!(ctl.is_replaying());
    ctl.initialize_iteration(3, Some(&pair), &mut search);
    assert!(!ctl.is_replaying());
    assert_eq!(search.random_iterations(), 1);
}

#[test]
fn test_disabled_mode_records_but_never_mutates() {
    let mut search = SearchState::new();
    let mut ctl = controller(
        ControllerVariant::RoundRobin,
        RunMode::Disabled,
        FreshOracle { next: 0, per_call: 4 },
    );
    ctl.initialize_iteration(1, Some(&scenario_pair()), &mut search);
    assert_eq!(search.states_seen(), 4);
    assert_eq!(search.state_history(), &[0, 4]);
    assert_eq!(search.candidates_enqueued(), 0);
    assert!(!ctl.is_replaying());
}

#[test]
fn test_trace_novelty_counts_unseen_signatures() {
    let mut search = SearchState::new();
    let mut ctl = controller(
        ControllerVariant::Interleaved,
        RunMode::TraceNovelty,
        FixedOracle { keys: vec![7] },
    );
    let pair = scenario_pair();
    ctl.initialize_iteration(1, Some(&pair), &mut search);
    assert_eq!(search.traces_seen(), 1);
    assert_eq!(search.candidates_enqueued(), 1);

    ctl.initialize_iteration(2, Some(&pair), &mut search);
    assert_eq!(search.candidates_enqueued(), 1);

    let mut other = pair.clone();
    other.high.swap(0, 2);
    ctl.initialize_iteration(3, Some(&other), &mut search);
    assert_eq!(search.traces_seen(), 2);
    assert_eq!(search.candidates_enqueued(), 2);
}

#[test]
fn test_state_mode_does_not_track_signatures() {
    let mut search = SearchState::new();
    let mut ctl = controller(
        ControllerVariant::Interleaved,
        RunMode::StateNovelty,
        FixedOracle { keys: vec![7] },
    );
    ctl.initialize_iteration(1, Some(&scenario_pair()), &mut search);
    assert_eq!(search.traces_seen(), 0);
}

#[test]
fn test_failed_mutations_are_counted_not_queued() {
    let mut search = SearchState::new();
    let mut ctl = FuzzingController::new(
        ControllerVariant::RoundRobin,
        RunMode::StateNovelty,
        Box::new(NoOpMutator),
        Box::new(FixedOracle { keys: vec![1, 2] }),
        42,
    );
    ctl.initialize_iteration(1, Some(&scenario_pair()), &mut search);
    assert_eq!(search.candidates_enqueued(), 0);
    assert_eq!(search.mutation_failures(), 10);
    assert!(!ctl.is_replaying());
}

#[test]
fn test_oracle_failure_degrades_to_random() {
    let mut search = SearchState::new();
    let mut ctl = controller(
        ControllerVariant::Interleaved,
        RunMode::StateNovelty,
        FixedOracle { keys: vec![] },
    );
    ctl.initialize_iteration(1, Some(&scenario_pair()), &mut search);
    assert_eq!(search.state_history(), &[0, 0]);
    assert!(!ctl.is_replaying());
}

#[test]
fn test_round_robin_replays_by_operation_name() {
    let mut search = SearchState::new();
    let mut ctl = controller(
        ControllerVariant::RoundRobin,
        RunMode::StateNovelty,
        FixedOracle { keys: vec![1] },
    );
    ctl.initialize_iteration(1, Some(&scenario_pair()), &mut search);

    // Ids differ from the recording; only names are matched.
    let ops = ready(&[(10, "A"), (20, "B")]);
    assert_eq!(ctl.next_operation(&ops, None, false).name, "A");
    assert_eq!(ctl.next_operation(&ops, None, false).name, "B");
    assert_eq!(ctl.next_operation(&ops, None, false).name, "B");
    assert_eq!(ctl.loaded().map(|c| c.high.len()), Some(0));
    assert_eq!(ctl.replayed_decisions(), 3);
}

#[test]
fn test_round_robin_skips_steps_of_unready_operations() {
    let mut search = SearchState::new();
    let mut ctl = controller(
        ControllerVariant::RoundRobin,
        RunMode::StateNovelty,
        FixedOracle { keys: vec![1] },
    );
    ctl.initialize_iteration(1, Some(&scenario_pair()), &mut search);

    let only_b = ready(&[(2, "B")]);
    assert_eq!(ctl.next_operation(&only_b, None, false).name, "B");
    // The A-owned send is still pending.
    let loaded = ctl.loaded().unwrap();
    assert_eq!(loaded.high.len(), 2);
    assert_eq!(loaded.high.get(0).and_then(|s| s.owner()).map(|o| o.name.as_str()), Some("A"));
}

#[test]
fn test_exhausted_candidate_falls_back_within_ready_set() {
    let mut search = SearchState::new();
    let mut ctl = controller(
        ControllerVariant::RoundRobin,
        RunMode::StateNovelty,
        FixedOracle { keys: vec![1] },
    );
    ctl.initialize_iteration(1, Some(&scenario_pair()), &mut search);

    let ops = ready(&[(5, "X"), (6, "Y")]);
    for _ in 0..10 {
        let chosen = ctl.next_operation(&ops, None, false);
        assert!(ops.contains(chosen));
    }
    assert_eq!(ctl.replayed_decisions(), 0);
    assert_eq!(ctl.fallback_decisions(), 10);
}

#[test]
fn test_round_robin_integers_stay_in_bounds() {
    let mut search = SearchState::new();
    let mut ctl = controller(
        ControllerVariant::RoundRobin,
        RunMode::StateNovelty,
        FixedOracle { keys: vec![1] },
    );
    ctl.initialize_iteration(1, Some(&scenario_pair()), &mut search);
    for _ in 0..50 {
        let v = ctl.next_integer(None, 3);
        assert!((0..3).contains(&v));
    }
}

/// `[InvokedAction(B,"act"), Send(A->B,"m")]`, scheduled B then A.
fn b_then_a_pair() -> TracePair {
    let a = op(1, "A");
    let b = op(2, "B");
    let high = HighLevelTrace::from(vec![
        Step::action(b.clone(), "act"),
        Step::send(a, b, EventDescriptor::new("m")),
    ]);
    let low = LowLevelTrace::from(vec![Decision::schedule(2), Decision::schedule(1)]);
    TracePair::new(high, low)
}

#[test]
fn test_replay_follows_mutated_high_level_order() {
    for variant in [ControllerVariant::Interleaved, ControllerVariant::RoundRobin] {
        let mut search = SearchState::new();
        let mut ctl = FuzzingController::new(
            variant,
            RunMode::StateNovelty,
            Box::new(SwapOperationStepsMutator::new()),
            Box::new(FixedOracle { keys: vec![1] }),
            42,
        );
        ctl.initialize_iteration(1, Some(&b_then_a_pair()), &mut search);

        // The swap only touches the high-level trace; the low-level one still
        // schedules B first.
        let loaded = ctl.loaded().unwrap();
        assert_eq!(loaded.low.get(0), Some(&Decision::schedule(2)));

        let ops = ready(&[(1, "A"), (2, "B")]);
        assert_eq!(ctl.next_operation(&ops, None, false).name, "A", "{variant:?}");
        assert_eq!(ctl.next_operation(&ops, None, false).name, "B", "{variant:?}");
    }
}

#[test]
fn test_both_variants_cycle_booleans_and_draw_integers() {
    for variant in [ControllerVariant::Interleaved, ControllerVariant::RoundRobin] {
        let mut search = SearchState::new();
        let mut ctl = controller(variant, RunMode::StateNovelty, FixedOracle { keys: vec![1] });
        ctl.initialize_iteration(1, Some(&scenario_pair()), &mut search);

        let values: Vec<bool> = (0..5).map(|_| ctl.next_boolean(None)).collect();
        assert_eq!(values, vec![true, false, true, false, true], "{variant:?}");

        let v = ctl.next_integer(None, 2);
        assert!((0..2).contains(&v));
        assert_eq!(ctl.replayed_decisions(), 5);
        assert_eq!(ctl.fallback_decisions(), 1);
    }
}

#[test]
fn test_observed_iteration_is_scored_without_loading() {
    let mut search = SearchState::new();
    let mut ctl = controller(
        ControllerVariant::RoundRobin,
        RunMode::StateNovelty,
        FreshOracle { next: 0, per_call: 2 },
    );
    ctl.observe_iteration(1, &scenario_pair(), &mut search);
    assert_eq!(search.states_seen(), 2);
    assert_eq!(search.state_history(), &[0, 2]);
    assert_eq!(search.candidates_enqueued(), 10);
    assert!(!ctl.is_replaying());

    // Its own turn scores the next run and replays a queued mutant.
    ctl.initialize_iteration(2, Some(&scenario_pair()), &mut search);
    assert_eq!(search.state_history(), &[0, 2, 4]);
    assert!(ctl.is_replaying());
    assert_eq!(search.queue_len(), 19);
}

#[test]
fn test_next_operation_stays_in_ready_set() {
    for seed in 0..40u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for variant in [ControllerVariant::Interleaved, ControllerVariant::RoundRobin] {
            let mut search = SearchState::new();
            let mut ctl = FuzzingController::new(
                variant,
                RunMode::StateNovelty,
                Box::new(CloneMutator),
                Box::new(FreshOracle { next: 0, per_call: 1 }),
                seed,
            );

            for iteration in 0..5u32 {
                let recorded = random_pair(&mut rng);
                ctl.initialize_iteration(iteration, Some(&recorded), &mut search);
                for _ in 0..30 {
                    let ops = random_ready_set(&mut rng);
                    let chosen = ctl.next_operation(&ops, None, rng.gen());
                    assert!(ops.contains(chosen), "seed {seed}: {chosen} not ready");
                }
            }
        }
    }
}

fn random_ready_set(rng: &mut ChaCha8Rng) -> Vec<Operation> {
    let len = rng.gen_range(1..=5);
    (0..len)
        .map(|_| {
            let id = rng.gen_range(0..8u64);
            Operation::new(id, format!("Op({id})"))
        })
        .collect()
}

fn random_pair(rng: &mut ChaCha8Rng) -> TracePair {
    let mut high = HighLevelTrace::new();
    let mut low = LowLevelTrace::new();
    for _ in 0..rng.gen_range(0..12) {
        let a = rng.gen_range(0..8u64);
        let b = rng.gen_range(0..8u64);
        let from = OperationRef::new(a, format!("Op({a})"));
        let to = OperationRef::new(b, format!("Op({b})"));
        match rng.gen_range(0..4) {
            0 => high.push(Step::send(from, to, EventDescriptor::new("e"))),
            1 => high.push(Step::receive(from, to, EventDescriptor::new("e"))),
            2 => high.push(Step::action(from, "act")),
            _ => high.push(Step::Delay),
        }
        match rng.gen_range(0..3) {
            0 => low.push(Decision::schedule(a)),
            1 => low.push(Decision::boolean(rng.gen())),
            _ => low.push(Decision::integer(rng.gen_range(-2..6))),
        }
    }
    TracePair::new(high, low)
}

#[test]
fn test_finalize_reports() {
    let search = SearchState::new();
    let mut ctl = controller(
        ControllerVariant::RoundRobin,
        RunMode::StateNovelty,
        FixedOracle { keys: vec![] },
    );
    assert!(ctl.finalize(&search));
    assert_eq!(ctl.name(), "round_robin_fuzzing");
    assert!(ctl.description().contains("mode:state_novelty"));
}
