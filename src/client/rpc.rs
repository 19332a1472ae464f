//! Call Client
//!
//! Executes one JSON-RPC round trip per call and normalizes its outcome:
//! encode params, allocate an id, send, receive, then classify the response.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use xeth_protocol::response::value_kind;
use xeth_protocol::{ErrorObject, Request, Response};

use super::channel::{Channel, ChannelError};

/// Stage of a call at which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Serializing the parameters.
    Encode,
    /// Handing the request to the channel.
    Send,
    /// Waiting for the response.
    Receive,
    /// Interpreting the response.
    Classify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Encode => write!(f, "encode"),
            Stage::Send => write!(f, "send"),
            Stage::Receive => write!(f, "receive"),
            Stage::Classify => write!(f, "classify"),
        }
    }
}

/// Envelope-level violations by the peer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolViolation {
    #[error("response id {actual:?} does not match request id {expected}")]
    MismatchedId { expected: u32, actual: Option<u32> },

    #[error("unrecognised response envelope: {shape}")]
    UnknownEnvelope { shape: String },
}

/// Call errors
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("Failed to encode params: {0}")]
    Encoding(#[source] serde_json::Error),

    #[error("Transport error during {stage}: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: ChannelError,
    },

    #[error("Method invocation failed: {0}")]
    Remote(ErrorObject),

    #[error("Expected an object result, got {found}")]
    UnexpectedResultShape { found: &'static str, result: Value },

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolViolation),

    #[error("Request ids exhausted after {last}")]
    IdsExhausted { last: u32 },
}

/// Failure kind for exit code mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Params could not be serialized (exit code 10)
    Encoding = 10,
    /// Channel send/receive failures (exit code 20)
    Transport = 20,
    /// Peer reported an error (exit code 30)
    Remote = 30,
    /// Peer succeeded with a non-object result (exit code 40)
    UnexpectedResultShape = 40,
    /// Malformed or uncorrelated response (exit code 50)
    Protocol = 50,
    /// No request id left on this client (exit code 60)
    Exhausted = 60,
}

impl CallError {
    /// Stage of the call that failed
    pub fn stage(&self) -> Stage {
        match self {
            CallError::Encoding(_) | CallError::IdsExhausted { .. } => Stage::Encode,
            CallError::Transport { stage, .. } => *stage,
            CallError::Remote(_)
            | CallError::UnexpectedResultShape { .. }
            | CallError::Protocol(_) => Stage::Classify,
        }
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            CallError::Encoding(_) => FailureKind::Encoding,
            CallError::Transport { .. } => FailureKind::Transport,
            CallError::Remote(_) => FailureKind::Remote,
            CallError::UnexpectedResultShape { .. } => FailureKind::UnexpectedResultShape,
            CallError::Protocol(_) => FailureKind::Protocol,
            CallError::IdsExhausted { .. } => FailureKind::Exhausted,
        }
    }

    /// Get exit code for this error
    pub fn exit_code(&self) -> i32 {
        self.failure_kind() as i32
    }

    /// The peer's error payload, when the peer reported the failure.
    pub fn remote(&self) -> Option<&ErrorObject> {
        match self {
            CallError::Remote(payload) => Some(payload),
            _ => None,
        }
    }
}

/// Result type for call operations
pub type CallResult<T> = Result<T, CallError>;

/// JSON-RPC call client.
///
/// Shareable across threads; concurrent callers only contend on the id counter.
pub struct RpcClient {
    channel: Arc<dyn Channel>,
    /// Last issued request id
    request_counter: AtomicU32,
}

impl RpcClient {
    /// Create a new client over the given channel
    pub fn new(channel: Arc<dyn Channel>) -> Self {
        Self {
            channel,
            request_counter: AtomicU32::new(0),
        }
    }

    /// Allocate the next request id. The first id issued is 1; once
    /// `u32::MAX` has been issued every further call fails.
    fn next_request_id(&self) -> CallResult<u32> {
        self.request_counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| last.checked_add(1))
            .map(|last| last + 1)
            .map_err(|last| CallError::IdsExhausted { last })
    }

    /// Most recently issued request id, 0 before the first call.
    pub fn last_request_id(&self) -> u32 {
        self.request_counter.load(Ordering::SeqCst)
    }

    /// Invoke `method` with positional `params` and return the result object.
    ///
    /// Exactly one request is sent and one response received. The response
    /// must carry the request's id; the result must be a JSON object.
    pub fn call<P: Serialize>(&self, method: &str, params: &[P]) -> CallResult<Map<String, Value>> {
        let params = serde_json::to_value(params).map_err(CallError::Encoding)?;

        let request = Request::new(self.next_request_id()?, method, params);
        debug!("-> {} id={} params={}", request.method, request.id, request.arity());

        self.channel
            .send(&request)
            .map_err(|source| CallError::Transport { stage: Stage::Send, source })?;

        let response = self
            .channel
            .receive()
            .map_err(|source| CallError::Transport { stage: Stage::Receive, source })?;

        classify(&request, response)
    }
}

/// Turn a response into the call outcome for `request`.
fn classify(request: &Request, response: Response) -> CallResult<Map<String, Value>> {
    match response {
        Response::Error(failure) => {
            check_correlation(request, failure.id)?;
            debug!("<- {} id={} error {}", request.method, request.id, failure.error);
            Err(CallError::Remote(failure.error))
        }
        Response::Success(success) => {
            check_correlation(request, Some(success.id))?;
            debug!("<- {} id={} ok", request.method, request.id);
            match success.result {
                Value::Object(map) => Ok(map),
                other => Err(CallError::UnexpectedResultShape {
                    found: value_kind(&other),
                    result: other,
                }),
            }
        }
        unknown @ Response::Unknown(_) => {
            let shape = unknown.shape();
            warn!("{} id={}: unrecognised response envelope ({})", request.method, request.id, shape);
            Err(ProtocolViolation::UnknownEnvelope { shape }.into())
        }
    }
}

fn check_correlation(request: &Request, actual: Option<u32>) -> Result<(), ProtocolViolation> {
    if actual == Some(request.id) {
        return Ok(());
    }
    warn!(
        "{}: response id {:?} does not match request id {}",
        request.method, actual, request.id
    );
    Err(ProtocolViolation::MismatchedId {
        expected: request.id,
        actual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChannel;
    use serde_json::json;

    fn create_client(channel: MockChannel) -> (RpcClient, Arc<MockChannel>) {
        let channel = Arc::new(channel);
        (RpcClient::new(channel.clone()), channel)
    }

    #[test]
    fn test_first_id_is_one() {
        let (client, channel) = create_client(MockChannel::echo_result(json!({})));

        assert_eq!(client.last_request_id(), 0);
        client.call::<Value>("net_version", &[]).unwrap();

        assert_eq!(channel.sent()[0].id, 1);
        assert_eq!(client.last_request_id(), 1);
    }

    #[test]
    fn test_request_id_generation() {
        let (client, _) = create_client(MockChannel::echo_result(json!({})));

        let id1 = client.next_request_id().unwrap();
        let id2 = client.next_request_id().unwrap();

        assert_eq!(id1, 1);
        assert_eq!(id2, 2);
    }

    #[test]
    fn test_counter_never_wraps() {
        let (client, channel) = create_client(MockChannel::echo_result(json!({})));
        client.request_counter.store(u32::MAX - 1, Ordering::SeqCst);

        client.call::<Value>("eth_blockNumber", &[]).unwrap();
        assert_eq!(channel.sent()[0].id, u32::MAX);

        let err = client.call::<Value>("eth_blockNumber", &[]).unwrap_err();
        assert!(matches!(err, CallError::IdsExhausted { last: u32::MAX }));
        assert_eq!(err.exit_code(), 60);
        assert_eq!(err.stage(), Stage::Encode);
        assert_eq!(channel.sent().len(), 1);
        assert_eq!(client.last_request_id(), u32::MAX);
    }

    #[test]
    fn test_params_become_array() {
        let (client, channel) = create_client(MockChannel::echo_result(json!({})));

        client
            .call("eth_getBalance", &[json!("0xdeadbeef"), json!("latest")])
            .unwrap();

        let sent = channel.sent();
        assert_eq!(sent[0].method, "eth_getBalance");
        assert_eq!(sent[0].params, json!(["0xdeadbeef", "latest"]));
    }

    #[test]
    fn test_encoding_error_sends_nothing() {
        use std::collections::HashMap;

        let (client, channel) = create_client(MockChannel::echo_result(json!({})));

        // Map keys must be strings in JSON.
        let mut bad = HashMap::new();
        bad.insert(vec![1u8, 2], "x");

        let err = client.call("eth_call", &[bad]).unwrap_err();
        assert!(matches!(err, CallError::Encoding(_)));
        assert_eq!(err.stage(), Stage::Encode);
        assert!(channel.sent().is_empty());
        assert_eq!(client.last_request_id(), 0);
    }

    #[test]
    fn test_error_with_null_id_is_protocol() {
        let payload = ErrorObject::new(-32000, "for someone else");
        let (client, _) = create_client(MockChannel::replying(Response::error(None, payload)));

        let err = client.call::<Value>("eth_blockNumber", &[]).unwrap_err();
        assert!(matches!(
            err,
            CallError::Protocol(ProtocolViolation::MismatchedId { expected: 1, actual: None })
        ));
        assert!(err.remote().is_none());
    }

    #[test]
    fn test_error_with_wrong_id_is_protocol() {
        let payload = ErrorObject::new(-32601, "method not found");
        let (client, _) = create_client(MockChannel::replying(Response::error(Some(99), payload)));

        let err = client.call::<Value>("eth_blockNumber", &[]).unwrap_err();
        assert!(matches!(
            err,
            CallError::Protocol(ProtocolViolation::MismatchedId { expected: 1, actual: Some(99) })
        ));
    }

    #[test]
    fn test_unknown_envelope() {
        let (client, _) = create_client(MockChannel::replying(Response::Unknown(json!({"id": 1}))));

        let err = client.call::<Value>("eth_blockNumber", &[]).unwrap_err();
        match err {
            CallError::Protocol(ProtocolViolation::UnknownEnvelope { shape }) => {
                assert_eq!(shape, "object with members [id]");
            }
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[test]
    fn test_null_result_is_unexpected_shape() {
        let (client, _) = create_client(MockChannel::echo_result(Value::Null));

        let err = client.call::<Value>("eth_getBlockByHash", &[]).unwrap_err();
        assert!(matches!(err, CallError::UnexpectedResultShape { found: "null", .. }));
    }

    #[test]
    fn test_error_mapping() {
        let err = CallError::Remote(ErrorObject::new(-32000, "header not found"));
        assert_eq!(err.failure_kind(), FailureKind::Remote);
        assert_eq!(err.exit_code(), 30);
        assert_eq!(err.stage(), Stage::Classify);

        let err = CallError::Transport { stage: Stage::Receive, source: ChannelError::Timeout };
        assert_eq!(err.failure_kind(), FailureKind::Transport);
        assert_eq!(err.exit_code(), 20);
        assert_eq!(err.stage(), Stage::Receive);
        assert_eq!(err.to_string(), "Transport error during receive: Channel timed out");

        let err: CallError = ProtocolViolation::UnknownEnvelope { shape: "string".into() }.into();
        assert_eq!(err.exit_code(), 50);
    }

    #[test]
    fn test_remote_display_keeps_payload() {
        let err = CallError::Remote(ErrorObject::new(-32601, "method not found"));
        assert_eq!(err.to_string(), "Method invocation failed: method not found (-32601)");
    }
}
