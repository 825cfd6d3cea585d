//! Decision-trace data model.
//!
//! Two recordings exist for every execution:
//!
//! - [`HighLevelTrace`]: the semantic steps (sends, receives, actions,
//!   transitions) used by the state oracle and to align mutations.
//! - [`LowLevelTrace`]: the scheduling and choice decisions, sufficient to
//!   replay the execution bit-for-bit.

pub mod decision;
pub mod operation;
pub mod pair;
pub mod step;

pub use decision::{Choice, Decision, LowLevelTrace};
pub use operation::{Operation, OperationId, OperationRef};
pub use pair::{AbstractState, TraceCandidate, TracePair};
pub use step::{EventDescriptor, HighLevelTrace, Step};
