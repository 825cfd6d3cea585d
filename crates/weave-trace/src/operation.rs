use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime identity of a schedulable operation (actor, task or thread).
pub type OperationId = u64;

/// A reference to an operation as recorded in a trace.
///
/// `name` is the rendering the program under test gives the operation
/// (e.g. `"Server(2)"`). Replay of a high-level trace matches on the name,
/// replay of a low-level trace matches on the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationRef {
    pub id: OperationId,
    pub name: String,
}

impl OperationRef {
    pub fn new(id: OperationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for OperationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An operation the harness currently considers ready to run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub name: String,
}

impl Operation {
    pub fn new(id: OperationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// The trace-side reference to this operation.
    pub fn to_ref(&self) -> OperationRef {
        OperationRef::new(self.id, self.name.clone())
    }
}

impl From<&OperationRef> for Operation {
    fn from(r: &OperationRef) -> Self {
        Operation::new(r.id, r.name.clone())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
