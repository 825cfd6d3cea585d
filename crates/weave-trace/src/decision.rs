use serde::{Deserialize, Serialize};

use crate::operation::OperationId;

/// Payload of a nondeterministic choice. Exactly one kind per decision,
/// matching the query that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    Boolean(bool),
    Integer(i64),
}

/// A decision the scheduler must reproduce on replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// The operation with this id was scheduled next.
    Schedule { operation: OperationId },
    Nondeterministic { choice: Choice },
}

impl Decision {
    pub fn schedule(operation: OperationId) -> Self {
        Decision::Schedule { operation }
    }

    pub fn boolean(value: bool) -> Self {
        Decision::Nondeterministic {
            choice: Choice::Boolean(value),
        }
    }

    pub fn integer(value: i64) -> Self {
        Decision::Nondeterministic {
            choice: Choice::Integer(value),
        }
    }

    pub fn scheduled_operation(&self) -> Option<OperationId> {
        match self {
            Decision::Schedule { operation } => Some(*operation),
            Decision::Nondeterministic { .. } => None,
        }
    }

    pub fn boolean_choice(&self) -> Option<bool> {
        match self {
            Decision::Nondeterministic {
                choice: Choice::Boolean(b),
            } => Some(*b),
            _ => None,
        }
    }

    pub fn integer_choice(&self) -> Option<i64> {
        match self {
            Decision::Nondeterministic {
                choice: Choice::Integer(i),
            } => Some(*i),
            _ => None,
        }
    }
}

/// The low-level (decision) trace of one execution: the only structure
/// sufficient to replay it deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowLevelTrace {
    decisions: Vec<Decision>,
}

impl LowLevelTrace {
    pub fn new() -> Self {
        Self {
            decisions: Vec::new(),
        }
    }

    pub fn push(&mut self, decision: Decision) {
        self.decisions.push(decision);
    }

    pub fn get(&self, index: usize) -> Option<&Decision> {
        self.decisions.get(index)
    }

    pub fn set(&mut self, index: usize, decision: Decision) {
        self.decisions[index] = decision;
    }

    pub fn insert(&mut self, index: usize, decision: Decision) {
        self.decisions.insert(index, decision);
    }

    pub fn remove(&mut self, index: usize) -> Decision {
        self.decisions.remove(index)
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        self.decisions.swap(a, b);
    }

    pub fn clear(&mut self) {
        self.decisions.clear();
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Decision> {
        self.decisions.iter()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// Indices of all boolean nondeterministic decisions, in trace order.
    pub fn boolean_positions(&self) -> Vec<usize> {
        self.decisions
            .iter()
            .enumerate()
            .filter(|(_, d)| d.boolean_choice().is_some())
            .map(|(i, _)| i)
            .collect()
    }

    /// Values of all boolean nondeterministic decisions, in trace order.
    pub fn boolean_choices(&self) -> Vec<bool> {
        self.decisions
            .iter()
            .filter_map(Decision::boolean_choice)
            .collect()
    }
}

impl From<Vec<Decision>> for LowLevelTrace {
    fn from(decisions: Vec<Decision>) -> Self {
        Self { decisions }
    }
}

impl<'a> IntoIterator for &'a LowLevelTrace {
    type Item = &'a Decision;
    type IntoIter = std::slice::Iter<'a, Decision>;

    fn into_iter(self) -> Self::IntoIter {
        self.decisions.iter()
    }
}
