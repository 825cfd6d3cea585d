//! Replay-guided fuzzing: score each finished iteration against the state
//! oracle, mutate the novel ones, and replay the mutants.

pub mod controller;

pub use controller::{ControllerVariant, FuzzingController, RunMode};
