//! JSON wire format of the state oracle's `/execute` endpoint.
//!
//! Request: an array of event records terminated by a reset sentinel.
//! Response: `{ "States": [..], "Keys": [..] }`, field names matched
//! case-insensitively, the two arrays parallel.

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use weave_trace::{AbstractState, EventDescriptor, HighLevelTrace, OperationRef, Step};

use crate::error::OracleError;

/// Keys the core writes for send/receive steps; event parameters may not
/// override them.
const RESERVED_MESSAGE_KEYS: [&str; 5] = ["sender", "sender_id", "receiver", "receiver_id", "event"];

/// One record of the request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OracleEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, Value>>,
    pub reset: bool,
}

impl OracleEvent {
    pub fn event(name: &str, params: BTreeMap<String, Value>) -> Self {
        Self {
            name: Some(name.to_string()),
            params: Some(params),
            reset: false,
        }
    }

    /// Terminal sentinel appended after the last real step.
    pub fn reset() -> Self {
        Self {
            name: None,
            params: None,
            reset: true,
        }
    }

    pub fn is_reset(&self) -> bool {
        self.reset
    }
}

/// `id - index_offset` in decimal. Computed in `i128`, which holds every
/// `u64` id minus every `i64` offset.
fn render_id(op: &OperationRef, index_offset: i64) -> Value {
    Value::String((i128::from(op.id) - i128::from(index_offset)).to_string())
}

fn message_params(
    sender: &OperationRef,
    receiver: &OperationRef,
    event: &EventDescriptor,
    index_offset: i64,
) -> BTreeMap<String, Value> {
    let mut params = BTreeMap::new();
    params.insert("sender".to_string(), Value::String(sender.to_string()));
    params.insert("sender_id".to_string(), render_id(sender, index_offset));
    params.insert("receiver".to_string(), Value::String(receiver.to_string()));
    params.insert("receiver_id".to_string(), render_id(receiver, index_offset));
    params.insert("event".to_string(), Value::String(event.to_string()));

    for (key, value) in &event.params {
        if RESERVED_MESSAGE_KEYS.contains(&key.as_str()) {
            warn!(
                "event '{}' parameter '{}' collides with a reserved key; dropped",
                event.name, key
            );
            continue;
        }
        params.insert(key.clone(), value.clone());
    }
    params
}

fn actor_params(actor: &OperationRef, index_offset: i64) -> BTreeMap<String, Value> {
    let mut params = BTreeMap::new();
    params.insert("actor".to_string(), Value::String(actor.to_string()));
    params.insert("actor_id".to_string(), render_id(actor, index_offset));
    params
}

/// Convert a high-level trace into the request body records.
///
/// Steps with an unresolved operation reference, delays and choice steps
/// are omitted. A reset sentinel is always appended.
pub fn encode_trace(trace: &HighLevelTrace, index_offset: i64) -> Vec<OracleEvent> {
    let mut events = Vec::with_capacity(trace.len() + 1);

    for step in trace {
        let params = match step {
            Step::SendEvent {
                from: Some(from),
                to: Some(to),
                event,
            }
            | Step::ReceiveEvent {
                from: Some(from),
                to: Some(to),
                event,
            } => message_params(from, to, event, index_offset),
            Step::InvokedAction {
                operation: Some(op),
                action,
            } => {
                let mut params = actor_params(op, index_offset);
                params.insert("action".to_string(), Value::String(action.clone()));
                params
            }
            Step::StateTransition {
                operation: Some(op),
                from,
                to,
            } => {
                let mut params = actor_params(op, index_offset);
                params.insert("from".to_string(), Value::String(from.clone()));
                params.insert("to".to_string(), Value::String(to.clone()));
                params
            }
            _ => continue,
        };
        events.push(OracleEvent::event(step.kind(), params));
    }

    events.push(OracleEvent::reset());
    events
}

/// Serialize the request body for `trace`.
pub fn request_body(trace: &HighLevelTrace, index_offset: i64) -> Result<String, OracleError> {
    Ok(serde_json::to_string(&encode_trace(trace, index_offset))?)
}

fn field<'a>(object: &'a serde_json::Map<String, Value>, name: &str) -> Option<&'a Value> {
    object
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

/// Parse the oracle's response body into abstract states, in order.
pub fn decode_response(body: &str) -> Result<Vec<AbstractState>, OracleError> {
    // State renderings may carry raw newlines, which are not valid inside JSON strings.
    let body = body.replace('\n', "");
    let value: Value = serde_json::from_str(&body)?;
    let object = value
        .as_object()
        .ok_or_else(|| OracleError::Response("expected a JSON object".to_string()))?;

    let states = field(object, "states")
        .and_then(Value::as_array)
        .ok_or_else(|| OracleError::Response("missing 'States' array".to_string()))?;
    let keys = field(object, "keys")
        .and_then(Value::as_array)
        .ok_or_else(|| OracleError::Response("missing 'Keys' array".to_string()))?;

    if states.len() != keys.len() {
        return Err(OracleError::Response(format!(
            "{} states but {} keys",
            states.len(),
            keys.len()
        )));
    }

    states
        .iter()
        .zip(keys)
        .enumerate()
        .map(|(i, (state, key))| {
            let text = state
                .as_str()
                .ok_or_else(|| OracleError::Response(format!("state {i} is not a string")))?;
            let key = key
                .as_i64()
                .ok_or_else(|| OracleError::Response(format!("key {i} is not a 64-bit integer")))?;
            Ok(AbstractState::new(key, text))
        })
        .collect()
}
