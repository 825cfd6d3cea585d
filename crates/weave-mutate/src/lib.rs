//! Trace mutators: turn a finished execution's trace pair into a candidate
//! for a future iteration.
//!
//! Every mutator is pure apart from the random source passed to it. The
//! source is borrowed, never owned, so a sequence of mutations is
//! reproducible from one seeded generator.

pub mod choice;
pub mod delay;
pub mod swap;

use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use weave_trace::{TraceCandidate, TracePair};

pub use choice::{flip_one_boolean, FlipOneBooleanChoiceMutator};
pub use delay::InsertDelaysAndFlipMutator;
pub use swap::{SwapLowLevelDecisionsMutator, SwapOperationStepsMutator};

/// Produces one candidate trace pair from an existing one.
pub trait Mutator {
    /// `None` means no candidate could be produced (precondition not met).
    fn mutate(&self, source: &TracePair, rng: &mut dyn RngCore) -> Option<TraceCandidate>;

    /// Configuration name of this mutator.
    fn name(&self) -> &str;
}

/// Never produces a candidate. Used when no mutator is configured.
#[derive(Debug, Clone, Default)]
pub struct NoOpMutator;

impl Mutator for NoOpMutator {
    fn mutate(&self, _source: &TracePair, _rng: &mut dyn RngCore) -> Option<TraceCandidate> {
        None
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Mutator selection, keyed by configuration name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutatorKind {
    /// `"choice"`
    FlipBooleanChoice,
    /// `"process"`
    SwapLowLevelDecisions,
    /// `"delay"`
    InsertDelays,
    /// `"actor"`
    SwapOperationSteps,
    NoOp,
}

impl MutatorKind {
    /// Unknown names select [`MutatorKind::NoOp`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "choice" => MutatorKind::FlipBooleanChoice,
            "process" => MutatorKind::SwapLowLevelDecisions,
            "delay" => MutatorKind::InsertDelays,
            "actor" => MutatorKind::SwapOperationSteps,
            _ => MutatorKind::NoOp,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MutatorKind::FlipBooleanChoice => "choice",
            MutatorKind::SwapLowLevelDecisions => "process",
            MutatorKind::InsertDelays => "delay",
            MutatorKind::SwapOperationSteps => "actor",
            MutatorKind::NoOp => "none",
        }
    }
}

impl fmt::Display for MutatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Build the mutator for `kind`. `delays` only matters for the delay mutator.
pub fn build_mutator(kind: MutatorKind, delays: u32) -> Box<dyn Mutator> {
    match kind {
        MutatorKind::FlipBooleanChoice => Box::new(FlipOneBooleanChoiceMutator::new()),
        MutatorKind::SwapLowLevelDecisions => Box::new(SwapLowLevelDecisionsMutator::new()),
        MutatorKind::InsertDelays => Box::new(InsertDelaysAndFlipMutator::new(delays)),
        MutatorKind::SwapOperationSteps => Box::new(SwapOperationStepsMutator::new()),
        MutatorKind::NoOp => Box::new(NoOpMutator),
    }
}
