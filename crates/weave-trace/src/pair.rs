use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decision::LowLevelTrace;
use crate::step::HighLevelTrace;

/// The two recordings of one execution, kept together.
///
/// The traces are not index-aligned; they correlate only through the order of
/// decision-bearing events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TracePair {
    pub high: HighLevelTrace,
    pub low: LowLevelTrace,
}

impl TracePair {
    pub fn new(high: HighLevelTrace, low: LowLevelTrace) -> Self {
        Self { high, low }
    }

    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.low.is_empty()
    }
}

/// A mutated trace pair waiting in the work queue for a future iteration.
pub type TraceCandidate = TracePair;

/// One abstract global state reported by the state oracle.
///
/// `key` is the deduplication identity; `text` is diagnostic only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbstractState {
    pub key: i64,
    pub text: String,
}

impl AbstractState {
    pub fn new(key: i64, text: impl Into<String>) -> Self {
        Self {
            key,
            text: text.into(),
        }
    }
}

impl fmt::Display for AbstractState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
