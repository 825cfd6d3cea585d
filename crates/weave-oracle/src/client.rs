use log::{debug, warn};

use weave_trace::{AbstractState, HighLevelTrace};

use crate::error::OracleError;
use crate::transport::{HttpTransport, OracleEndpoint, OracleTransport};
use crate::wire::{decode_response, request_body};

/// Maps a high-level trace to the abstract global states it passes through.
///
/// Implementations never fail: an unreachable or misbehaving oracle yields an
/// empty list, which the search reads as "nothing new".
pub trait StateOracle {
    fn submit(&mut self, trace: &HighLevelTrace) -> Vec<AbstractState>;
}

impl<O: StateOracle + ?Sized> StateOracle for Box<O> {
    fn submit(&mut self, trace: &HighLevelTrace) -> Vec<AbstractState> {
        (**self).submit(trace)
    }
}

/// State oracle client speaking the `/execute` JSON protocol over a transport.
pub struct OracleClient<T: OracleTransport> {
    transport: T,
    /// Subtracted from raw operation ids before they are sent.
    index_offset: i64,
}

impl<T: OracleTransport> OracleClient<T> {
    pub fn new(transport: T, index_offset: i64) -> Self {
        Self {
            transport,
            index_offset,
        }
    }

    pub fn index_offset(&self) -> i64 {
        self.index_offset
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Submit `trace`, surfacing transport and parse failures.
    pub fn try_submit(&mut self, trace: &HighLevelTrace) -> Result<Vec<AbstractState>, OracleError> {
        let body = request_body(trace, self.index_offset)?;
        let response = self.transport.execute(&body)?;
        let states = decode_response(&response)?;
        debug!(
            "oracle returned {} states for a trace of {} steps",
            states.len(),
            trace.len()
        );
        Ok(states)
    }
}

impl OracleClient<HttpTransport> {
    /// Client for the HTTP oracle at `endpoint`.
    pub fn connect(endpoint: OracleEndpoint, index_offset: i64) -> Result<Self, OracleError> {
        Ok(Self::new(HttpTransport::new(endpoint)?, index_offset))
    }
}

impl<T: OracleTransport> StateOracle for OracleClient<T> {
    fn submit(&mut self, trace: &HighLevelTrace) -> Vec<AbstractState> {
        match self.try_submit(trace) {
            Ok(states) => states,
            Err(e) => {
                warn!("state oracle submission failed: {e}");
                Vec::new()
            }
        }
    }
}
