//! Scheduling strategies and the replay-guided fuzzing controllers.
//!
//! Every strategy answers the harness's three scheduling queries
//! ([`ExplorationStrategy`]) and takes part in the iteration lifecycle
//! ([`IterationLifecycle`]). Search-wide state lives in [`SearchState`],
//! owned by the caller and passed in at iteration boundaries.

pub mod fuzzing;
pub mod rng;
pub mod search;
pub mod strategy;

pub use fuzzing::{ControllerVariant, FuzzingController, RunMode};
pub use rng::stage_rng;
pub use search::SearchState;
pub use strategy::{
    ConsoleStrategy, ExplorationStrategy, IterationLifecycle, RandomStrategy, ReplayStrategy,
};
