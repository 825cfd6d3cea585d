//! Client for the external state oracle.
//!
//! The oracle replays a high-level trace against a model of the system and
//! answers with the canonical abstract states the trace visits. The core
//! treats the returned keys as opaque identities.

pub mod client;
pub mod error;
pub mod transport;
pub mod wire;

pub use client::{OracleClient, StateOracle};
pub use error::OracleError;
pub use transport::{HttpTransport, OracleEndpoint, OracleTransport};
pub use wire::{decode_response, encode_trace, OracleEvent};
