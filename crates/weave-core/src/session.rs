//! Harness glue: one program execution per iteration.

use log::info;

use crate::config::{ConfigError, FuzzConfig};
use crate::report::{JsonFileSink, MemorySink, ReportSink, SearchReport};
use crate::scheduler::Scheduler;

/// The concurrent program being explored.
///
/// `execute` runs the program once from its initial state, asking the
/// scheduler at every scheduling point and recording its observable steps.
pub trait ProgramUnderTest {
    fn execute(&mut self, scheduler: &mut Scheduler);
}

impl<F: FnMut(&mut Scheduler)> ProgramUnderTest for F {
    fn execute(&mut self, scheduler: &mut Scheduler) {
        self(scheduler)
    }
}

/// Run `iterations` executions of `program`, then finalize into `sink`.
///
/// Every iteration runs, whatever the oracle does.
pub fn run_session<P: ProgramUnderTest + ?Sized>(
    program: &mut P,
    scheduler: &mut Scheduler,
    iterations: u32,
    sink: &mut dyn ReportSink,
) -> SearchReport {
    for iteration in 0..iterations {
        scheduler.initialize_iteration(iteration);
        program.execute(scheduler);
    }
    scheduler.finalize(sink)
}

/// Build a scheduler from `config` and run the configured number of
/// iterations. The report goes to `config.output_path` when set.
pub fn run_from_config<P: ProgramUnderTest + ?Sized>(
    config: &FuzzConfig,
    program: &mut P,
) -> Result<SearchReport, ConfigError> {
    let mut scheduler = Scheduler::from_config(config)?;
    info!(
        "running {} iterations with strategy {:?}",
        config.iterations, config.strategy
    );
    let report = match &config.output_path {
        Some(prefix) => {
            let mut sink = JsonFileSink::new(prefix.clone());
            run_session(program, &mut scheduler, config.iterations, &mut sink)
        }
        None => {
            let mut sink = MemorySink::new();
            run_session(program, &mut scheduler, config.iterations, &mut sink)
        }
    };
    Ok(report)
}
