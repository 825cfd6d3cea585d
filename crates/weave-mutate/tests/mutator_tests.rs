use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use weave_mutate::{
    build_mutator, FlipOneBooleanChoiceMutator, InsertDelaysAndFlipMutator, Mutator,
    MutatorKind, NoOpMutator, SwapLowLevelDecisionsMutator, SwapOperationStepsMutator,
};
use weave_trace::{
    Decision, EventDescriptor, HighLevelTrace, LowLevelTrace, OperationRef, Step, TracePair,
};

fn op(id: u64) -> OperationRef {
    OperationRef::new(id, format!("Node({id})"))
}

/// Three operations exchanging messages, with a few decisions recorded.
fn sample_pair() -> TracePair {
    let high = HighLevelTrace::from(vec![
        Step::send(op(1), op(2), EventDescriptor::new("prepare")),
        Step::receive(op(1), op(2), EventDescriptor::new("prepare")),
        Step::action(op(2), "vote"),
        Step::transition(op(2), "Init", "Voted"),
        Step::send(op(2), op(1), EventDescriptor::new("vote")),
        Step::send(op(1), op(3), EventDescriptor::new("prepare")),
        Step::action(op(3), "vote"),
    ]);
    let low = LowLevelTrace::from(vec![
        Decision::schedule(1),
        Decision::boolean(true),
        Decision::schedule(2),
        Decision::integer(4),
        Decision::boolean(false),
        Decision::schedule(3),
        Decision::boolean(true),
    ]);
    TracePair::new(high, low)
}

fn single_operation_pair() -> TracePair {
    let high = HighLevelTrace::from(vec![
        Step::action(op(1), "a"),
        Step::send(op(1), op(1), EventDescriptor::new("self")),
        Step::action(op(1), "b"),
    ]);
    TracePair::new(high, LowLevelTrace::from(vec![Decision::schedule(1)]))
}

fn differing_positions<T: PartialEq>(a: &[T], b: &[T]) -> Vec<usize> {
    a.iter()
        .zip(b.iter())
        .enumerate()
        .filter(|(_, (x, y))| x != y)
        .map(|(i, _)| i)
        .collect()
}

#[test]
fn test_noop_never_produces_candidate() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    assert!(NoOpMutator.mutate(&sample_pair(), &mut rng).is_none());
}

#[test]
fn test_swap_operation_steps_changes_exactly_two_positions() {
    let source = sample_pair();
    for seed in 0..200 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let candidate = SwapOperationStepsMutator::new()
            .mutate(&source, &mut rng)
            .expect("trace has several operations");

        assert_eq!(candidate.high.len(), source.high.len());
        assert_eq!(candidate.low, source.low);

        let changed = differing_positions(source.high.steps(), candidate.high.steps());
        assert_eq!(changed.len(), 2, "seed {seed}");
        let (i, j) = (changed[0], changed[1]);
        assert_eq!(candidate.high.get(i), source.high.get(j));
        assert_eq!(candidate.high.get(j), source.high.get(i));
        assert!(candidate.high.get(i).unwrap().is_operation_step());
        assert_ne!(
            source.high.get(i).unwrap().owner(),
            source.high.get(j).unwrap().owner()
        );
    }
}

#[test]
fn test_swap_operation_steps_single_operation_terminates_with_none() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    assert!(SwapOperationStepsMutator::new()
        .mutate(&single_operation_pair(), &mut rng)
        .is_none());
    assert!(SwapOperationStepsMutator::new()
        .mutate(&TracePair::default(), &mut rng)
        .is_none());
}

#[test]
fn test_swap_operation_steps_ignores_unresolved_steps() {
    let high = HighLevelTrace::from(vec![
        Step::action(op(1), "a"),
        Step::InvokedAction {
            operation: None,
            action: "ghost".to_string(),
        },
    ]);
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let pair = TracePair::new(high, LowLevelTrace::new());
    assert!(SwapOperationStepsMutator::new().mutate(&pair, &mut rng).is_none());
}

#[test]
fn test_flip_one_boolean_changes_exactly_one_boolean() {
    let source = sample_pair();
    for seed in 0..200 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let candidate = FlipOneBooleanChoiceMutator::new()
            .mutate(&source, &mut rng)
            .unwrap();

        assert_eq!(candidate.high, source.high);
        let changed = differing_positions(source.low.decisions(), candidate.low.decisions());
        assert_eq!(changed.len(), 1, "seed {seed}");
        let idx = changed[0];
        assert_eq!(
            candidate.low.get(idx).unwrap().boolean_choice(),
            source.low.get(idx).unwrap().boolean_choice().map(|b| !b)
        );
    }
}

#[test]
fn test_flip_one_boolean_without_booleans_is_none() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    assert!(FlipOneBooleanChoiceMutator::new()
        .mutate(&single_operation_pair(), &mut rng)
        .is_none());
}

#[test]
fn test_delay_mutator_places_delays_before_sends_and_actions() {
    let source = sample_pair();
    let mutator = InsertDelaysAndFlipMutator::new(3);
    for seed in 0..100 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let candidate = mutator.mutate(&source, &mut rng).unwrap();

        let steps = candidate.high.steps();
        let delays: Vec<usize> = steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_delay())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(delays.len(), 3);
        for i in delays {
            // Delays may stack; the run of delays ends at a send or action.
            let next = steps[i..].iter().find(|s| !s.is_delay()).unwrap();
            assert!(next.accepts_delay());
        }

        let non_delay: Vec<&Step> = steps.iter().filter(|s| !s.is_delay()).collect();
        assert_eq!(non_delay, source.high.steps().iter().collect::<Vec<_>>());

        let flipped = differing_positions(source.low.decisions(), candidate.low.decisions());
        assert_eq!(flipped.len(), 1);
    }
}

#[test]
fn test_delay_mutator_replaces_existing_delays() {
    let mutator = InsertDelaysAndFlipMutator::new(2);
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let once = mutator.mutate(&sample_pair(), &mut rng).unwrap();
    let twice = mutator.mutate(&once, &mut rng).unwrap();
    assert_eq!(twice.high.iter().filter(|s| s.is_delay()).count(), 2);
}

#[test]
fn test_delay_mutator_degenerate_trace_is_none() {
    let pair = TracePair::new(
        HighLevelTrace::from(vec![Step::transition(op(1), "A", "B")]),
        LowLevelTrace::from(vec![Decision::schedule(1)]),
    );
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    assert!(InsertDelaysAndFlipMutator::new(4).mutate(&pair, &mut rng).is_none());
}

#[test]
fn test_swap_low_level_decisions_swaps_two_distinct_positions() {
    let source = sample_pair();
    for seed in 0..200 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let candidate = SwapLowLevelDecisionsMutator::new()
            .mutate(&source, &mut rng)
            .unwrap();
        assert_eq!(candidate.high, source.high);
        assert_eq!(candidate.low.len(), source.low.len());

        let mut before: Vec<_> = source.low.decisions().to_vec();
        let mut after: Vec<_> = candidate.low.decisions().to_vec();
        before.sort_by_key(|d| format!("{d:?}"));
        after.sort_by_key(|d| format!("{d:?}"));
        assert_eq!(before, after);

        let changed = differing_positions(source.low.decisions(), candidate.low.decisions());
        assert!(changed.is_empty() || changed.len() == 2);
    }
}

#[test]
fn test_swap_low_level_decisions_needs_two_decisions() {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    assert!(SwapLowLevelDecisionsMutator::new()
        .mutate(&single_operation_pair(), &mut rng)
        .is_none());
}

#[test]
fn test_same_seed_same_mutation_sequence() {
    let source = sample_pair();
    let mutator = build_mutator(MutatorKind::SwapOperationSteps, 0);

    let mut rng1 = ChaCha8Rng::seed_from_u64(99);
    let mut rng2 = ChaCha8Rng::seed_from_u64(99);
    let run1: Vec<_> = (0..10).map(|_| mutator.mutate(&source, &mut rng1)).collect();
    let run2: Vec<_> = (0..10).map(|_| mutator.mutate(&source, &mut rng2)).collect();
    assert_eq!(run1, run2);
}
