//! Strategy portfolio, scheduler and session driver.
//!
//! The harness drives a [`Scheduler`]: it calls
//! [`Scheduler::initialize_iteration`] before each execution of the program
//! under test, forwards every scheduling query to it during the execution,
//! and calls [`Scheduler::finalize`] once the search is over.
//! [`run_session`] does all of that for a [`ProgramUnderTest`].

pub mod config;
pub mod portfolio;
pub mod report;
pub mod scheduler;
pub mod session;

pub use config::{ConfigError, FuzzConfig, StrategyKind};
pub use portfolio::Portfolio;
pub use report::{JsonFileSink, MemorySink, ReportError, ReportSink, SearchReport};
pub use scheduler::Scheduler;
pub use session::{run_from_config, run_session, ProgramUnderTest};
