use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::operation::{OperationId, OperationRef};

/// Event payload as supplied by the program under test.
///
/// Passed through unmodified: the core only renders the name (signatures,
/// oracle requests) and forwards the parameters to the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

impl EventDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for EventDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One observable, scheduling-relevant event of an execution.
///
/// Operation references are optional: a reference that could not be resolved
/// when the step was recorded (the operation had already halted) is `None`.
/// Such steps are skipped by mutation, signatures and oracle submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    SendEvent {
        from: Option<OperationRef>,
        to: Option<OperationRef>,
        event: EventDescriptor,
    },
    ReceiveEvent {
        from: Option<OperationRef>,
        to: Option<OperationRef>,
        event: EventDescriptor,
    },
    InvokedAction {
        operation: Option<OperationRef>,
        action: String,
    },
    StateTransition {
        operation: Option<OperationRef>,
        from: String,
        to: String,
    },
    /// Synthetic; only ever inserted by mutation.
    Delay,
    BooleanChoice {
        value: bool,
    },
    IntegerChoice {
        value: i64,
    },
}

impl Step {
    pub fn send(from: OperationRef, to: OperationRef, event: EventDescriptor) -> Self {
        Step::SendEvent {
            from: Some(from),
            to: Some(to),
            event,
        }
    }

    pub fn receive(from: OperationRef, to: OperationRef, event: EventDescriptor) -> Self {
        Step::ReceiveEvent {
            from: Some(from),
            to: Some(to),
            event,
        }
    }

    pub fn action(operation: OperationRef, action: impl Into<String>) -> Self {
        Step::InvokedAction {
            operation: Some(operation),
            action: action.into(),
        }
    }

    pub fn transition(operation: OperationRef, from: impl Into<String>, to: impl Into<String>) -> Self {
        Step::StateTransition {
            operation: Some(operation),
            from: from.into(),
            to: to.into(),
        }
    }

    /// Wire name of the step kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::SendEvent { .. } => "SendEvent",
            Step::ReceiveEvent { .. } => "ReceiveEvent",
            Step::InvokedAction { .. } => "InvokedAction",
            Step::StateTransition { .. } => "StateTransition",
            Step::Delay => "Delay",
            Step::BooleanChoice { .. } => "NondeterministicBooleanChoice",
            Step::IntegerChoice { .. } => "NondeterministicIntegerChoice",
        }
    }

    /// The operation that performed this step: the sender of a send, the
    /// receiver of a receive, the acting operation of an action or transition.
    pub fn owner(&self) -> Option<&OperationRef> {
        match self {
            Step::SendEvent { from, .. } => from.as_ref(),
            Step::ReceiveEvent { to, .. } => to.as_ref(),
            Step::InvokedAction { operation, .. } => operation.as_ref(),
            Step::StateTransition { operation, .. } => operation.as_ref(),
            Step::Delay | Step::BooleanChoice { .. } | Step::IntegerChoice { .. } => None,
        }
    }

    /// Send, receive and invoked-action steps: the kinds replay and the
    /// operation-swap mutator align on.
    pub fn is_operation_step(&self) -> bool {
        matches!(
            self,
            Step::SendEvent { .. } | Step::ReceiveEvent { .. } | Step::InvokedAction { .. }
        )
    }

    /// Positions a delay may be inserted in front of.
    pub fn accepts_delay(&self) -> bool {
        matches!(self, Step::SendEvent { .. } | Step::InvokedAction { .. })
    }

    pub fn is_delay(&self) -> bool {
        matches!(self, Step::Delay)
    }
}

/// The high-level (semantic) trace of one execution.
///
/// Append-only while recording; freely edited by position during mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighLevelTrace {
    steps: Vec<Step>,
}

impl HighLevelTrace {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn set(&mut self, index: usize, step: Step) {
        self.steps[index] = step;
    }

    pub fn insert(&mut self, index: usize, step: Step) {
        self.steps.insert(index, step);
    }

    pub fn remove(&mut self, index: usize) -> Step {
        self.steps.remove(index)
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        self.steps.swap(a, b);
    }

    pub fn retain<F: FnMut(&Step) -> bool>(&mut self, f: F) {
        self.steps.retain(f);
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Duplicate-detection key for trace novelty.
    ///
    /// `{from}_{to}_{event}_` for sends and receives, `{op}_{action}_` for
    /// invoked actions, in trace order. Steps with an unresolved operation
    /// reference, and all other kinds, contribute nothing.
    pub fn signature(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            match step {
                Step::SendEvent {
                    from: Some(from),
                    to: Some(to),
                    event,
                }
                | Step::ReceiveEvent {
                    from: Some(from),
                    to: Some(to),
                    event,
                } => {
                    let _ = write!(out, "{}_{}_{}_", from.id, to.id, event);
                }
                Step::InvokedAction {
                    operation: Some(op),
                    action,
                } => {
                    let _ = write!(out, "{}_{}_", op.id, action);
                }
                _ => {}
            }
        }
        out
    }

    /// Per-operation projection: each operation's sends and actions in the
    /// order it performed them, operations listed by ascending id.
    ///
    /// Insensitive to how the operations were interleaved, so two traces with
    /// the same projection differ only in scheduling.
    pub fn operation_projection(&self) -> String {
        let mut per_op: BTreeMap<OperationId, Vec<String>> = BTreeMap::new();
        for step in &self.steps {
            match step {
                Step::InvokedAction {
                    operation: Some(op),
                    action,
                } => per_op
                    .entry(op.id)
                    .or_default()
                    .push(format!("A{}-{}", op.id, action)),
                Step::SendEvent {
                    from: Some(from),
                    event,
                    ..
                } => per_op
                    .entry(from.id)
                    .or_default()
                    .push(format!("A{}-{}", from.id, event)),
                _ => {}
            }
        }

        let mut out = String::new();
        for entries in per_op.values() {
            for entry in entries {
                out.push_str(entry);
                out.push(',');
            }
        }
        out
    }
}

impl From<Vec<Step>> for HighLevelTrace {
    fn from(steps: Vec<Step>) -> Self {
        Self { steps }
    }
}

impl<'a> IntoIterator for &'a HighLevelTrace {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}
