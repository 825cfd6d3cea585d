use std::io;

use log::{debug, info, warn};

use weave_explore::rng::{portfolio_stage, FALLBACK_STAGE};
use weave_explore::{
    ConsoleStrategy, ControllerVariant, ExplorationStrategy, FuzzingController, RandomStrategy,
    ReplayStrategy, RunMode, SearchState,
};
use weave_mutate::build_mutator;
use weave_oracle::{OracleClient, StateOracle};
use weave_trace::{Decision, Operation, Step, TracePair};

use crate::config::{ConfigError, FuzzConfig, StrategyKind};
use crate::portfolio::Portfolio;
use crate::report::{ReportSink, SearchReport};

/// The harness-facing scheduler.
///
/// Forwards every scheduling query to the active portfolio strategy and
/// records the answer, so the finished iteration can be handed back to the
/// strategies at the next iteration boundary.
pub struct Scheduler {
    portfolio: Portfolio,
    search: SearchState,
    /// Name of the configured lead strategy, used in the report.
    strategy_name: String,
    recording: TracePair,
    last_recording: TracePair,
    iteration: Option<u32>,
}

fn fuzzing_controller(
    config: &FuzzConfig,
    run_mode: RunMode,
    variant: ControllerVariant,
    oracle: Box<dyn StateOracle>,
) -> Box<dyn ExplorationStrategy> {
    Box::new(FuzzingController::new(
        variant,
        run_mode,
        build_mutator(config.mutator_kind(), config.delays),
        oracle,
        config.seed,
    ))
}

impl Scheduler {
    pub fn new(portfolio: Portfolio) -> Self {
        let strategy_name = portfolio.active().name().to_string();
        Self {
            portfolio,
            search: SearchState::new(),
            strategy_name,
            recording: TracePair::default(),
            last_recording: TracePair::default(),
            iteration: None,
        }
    }

    /// Build the portfolio described by `config`, talking to the HTTP state
    /// oracle when the lead strategy is a fuzzing one.
    pub fn from_config(config: &FuzzConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let oracle: Option<Box<dyn StateOracle>> = if config.strategy.is_fuzzing() {
            let client: Box<dyn StateOracle> = Box::new(OracleClient::connect(
                config.oracle.clone(),
                config.index_offset,
            )?);
            Some(client)
        } else {
            None
        };
        Self::build(config, oracle)
    }

    /// Like [`Scheduler::from_config`], with a caller-supplied oracle.
    pub fn with_oracle(
        config: &FuzzConfig,
        oracle: Box<dyn StateOracle>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::build(config, Some(oracle))
    }

    fn build(config: &FuzzConfig, oracle: Option<Box<dyn StateOracle>>) -> Result<Self, ConfigError> {
        let run_mode = config.run_mode()?;
        let fallback = || RandomStrategy::new(config.seed, FALLBACK_STAGE);
        let lead: Box<dyn ExplorationStrategy> = match (config.strategy, oracle) {
            (StrategyKind::InterleavedFuzzing, Some(oracle)) => {
                fuzzing_controller(config, run_mode, ControllerVariant::Interleaved, oracle)
            }
            (StrategyKind::RoundRobinFuzzing, Some(oracle)) => {
                fuzzing_controller(config, run_mode, ControllerVariant::RoundRobin, oracle)
            }
            (StrategyKind::Console, _) => {
                Box::new(ConsoleStrategy::new(io::stdin().lock(), io::stdout()))
            }
            (StrategyKind::Replay, _) => {
                Box::new(ReplayStrategy::new(config.load_replay_trace()?, fallback()))
            }
            _ => Box::new(fallback()),
        };

        let mut portfolio = Portfolio::single(lead);
        for member in 0..config.portfolio_size {
            portfolio.push(Box::new(RandomStrategy::new(
                config.seed,
                portfolio_stage(member),
            )));
        }

        info!(
            "scheduler: portfolio [{}], run mode {run_mode}, mutator '{}', seed {}",
            portfolio.names().join(", "),
            config.mutator_kind(),
            config.seed
        );
        Ok(Self::new(portfolio))
    }

    /// Start iteration `iteration`: rotate the portfolio (after the first
    /// iteration), hand the finished recording to every strategy and start a
    /// fresh recording.
    ///
    /// The new active strategy receives the recording through
    /// `initialize_iteration`, the others through `observe_iteration`, so a
    /// run is scored once whichever member produced it.
    pub fn initialize_iteration(&mut self, iteration: u32) -> bool {
        self.search.note_iteration();
        let finished = std::mem::take(&mut self.recording);

        if iteration > 0 {
            self.portfolio.rotate();
            for strategy in self.portfolio.waiting_mut() {
                strategy.observe_iteration(iteration, &finished, &mut self.search);
            }
        }
        let previous = (iteration > 0).then_some(&finished);
        let ready = self
            .portfolio
            .active_mut()
            .initialize_iteration(iteration, previous, &mut self.search);

        debug!(
            "iteration {iteration}: strategy '{}', previous run had {} steps and {} decisions",
            self.portfolio.active().name(),
            finished.high.len(),
            finished.low.len()
        );
        self.last_recording = finished;
        self.iteration = Some(iteration);
        ready
    }

    /// Pick the next operation among `ready`.
    ///
    /// # Panics
    ///
    /// If `ready` is empty; the harness must never ask without a valid answer.
    pub fn next_operation<'a>(
        &mut self,
        ready: &'a [Operation],
        current: Option<&Operation>,
        is_yielding: bool,
    ) -> &'a Operation {
        assert!(!ready.is_empty(), "scheduling query with an empty ready set");
        let chosen = self
            .portfolio
            .active_mut()
            .next_operation(ready, current, is_yielding);
        self.recording.low.push(Decision::schedule(chosen.id));
        chosen
    }

    pub fn next_boolean(&mut self, current: Option<&Operation>) -> bool {
        let value = self.portfolio.active_mut().next_boolean(current);
        self.recording.low.push(Decision::boolean(value));
        self.recording.high.push(Step::BooleanChoice { value });
        value
    }

    pub fn next_integer(&mut self, current: Option<&Operation>, bound: i64) -> i64 {
        let value = self.portfolio.active_mut().next_integer(current, bound);
        self.recording.low.push(Decision::integer(value));
        self.recording.high.push(Step::IntegerChoice { value });
        value
    }

    /// Append an observable step of the program to the in-flight recording.
    pub fn record_step(&mut self, step: Step) {
        self.recording.high.push(step);
    }

    /// End the search: finalize every strategy, build the report and hand it
    /// to `sink`. Sink failures are logged.
    pub fn finalize(&mut self, sink: &mut dyn ReportSink) -> SearchReport {
        for strategy in self.portfolio.iter_mut() {
            strategy.finalize(&self.search);
        }

        let report = SearchReport::from_search(self.strategy_name.clone(), &self.search);
        info!(
            "search finished: {} iterations, {} states, {} traces, {} random iterations",
            report.iterations, report.states_seen, report.traces_seen, report.random_iterations
        );
        if let Err(e) = sink.write(&report) {
            warn!("failed to write search report: {e}");
        }
        report
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Recording of the iteration in flight.
    pub fn recording(&self) -> &TracePair {
        &self.recording
    }

    /// Recording of the most recently finished iteration.
    pub fn last_recording(&self) -> &TracePair {
        &self.last_recording
    }

    pub fn iteration(&self) -> Option<u32> {
        self.iteration
    }
}
