//! Error payload carried by JSON-RPC error responses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Error codes reserved by JSON-RPC 2.0.
///
/// Peers are free to use any other integer; those simply have no entry here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received by the peer.
    ParseError,
    /// The JSON sent is not a valid request object.
    InvalidRequest,
    /// The method does not exist or is not available.
    MethodNotFound,
    /// Invalid method parameters.
    InvalidParams,
    /// Internal JSON-RPC error.
    InternalError,
    /// Implementation-defined server error (`-32000..=-32099`).
    ServerError(i64),
}

impl ErrorCode {
    /// Map a raw code onto the reserved registry.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -32700 => Some(Self::ParseError),
            -32600 => Some(Self::InvalidRequest),
            -32601 => Some(Self::MethodNotFound),
            -32602 => Some(Self::InvalidParams),
            -32603 => Some(Self::InternalError),
            -32099..=-32000 => Some(Self::ServerError(code)),
            _ => None,
        }
    }

    /// The raw integer code.
    pub fn code(&self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ServerError(code) => *code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseError => write!(f, "parse error"),
            Self::InvalidRequest => write!(f, "invalid request"),
            Self::MethodNotFound => write!(f, "method not found"),
            Self::InvalidParams => write!(f, "invalid params"),
            Self::InternalError => write!(f, "internal error"),
            Self::ServerError(code) => write!(f, "server error ({})", code),
        }
    }
}

/// Error object reported by the peer.
///
/// Holds the `error` member exactly as received, so it can be handed back to
/// the caller unchanged. `code`, `message` and `data` are typed views over it;
/// a peer that omits or mistypes one of them still produces an error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorObject(Map<String, Value>);

impl ErrorObject {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        let mut members = Map::new();
        members.insert("code".to_string(), Value::from(code));
        members.insert("message".to_string(), Value::String(message.into()));
        Self(members)
    }

    /// Integer `code` member, if present.
    pub fn code(&self) -> Option<i64> {
        self.0.get("code").and_then(Value::as_i64)
    }

    /// String `message` member, if present.
    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    /// The `data` member. An explicit `"data": null` is `Some(&Value::Null)`.
    pub fn data(&self) -> Option<&Value> {
        self.0.get("data")
    }

    /// Any member by name, including implementation-specific ones.
    pub fn get(&self, member: &str) -> Option<&Value> {
        self.0.get(member)
    }

    /// Reserved code this payload uses, if any.
    pub fn standard_code(&self) -> Option<ErrorCode> {
        self.code().and_then(ErrorCode::from_code)
    }
}

impl From<ErrorCode> for ErrorObject {
    fn from(code: ErrorCode) -> Self {
        Self::new(code.code(), code.to_string())
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.message(), self.code()) {
            (Some(message), Some(code)) => write!(f, "{} ({})", message, code),
            (Some(message), None) => write!(f, "{}", message),
            (None, Some(code)) => write!(f, "error code {}", code),
            (None, None) => write!(f, "{}", Value::Object(self.0.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reserved_codes() {
        assert_eq!(ErrorCode::from_code(-32601), Some(ErrorCode::MethodNotFound));
        assert_eq!(ErrorCode::from_code(-32000), Some(ErrorCode::ServerError(-32000)));
        assert_eq!(ErrorCode::from_code(-32099), Some(ErrorCode::ServerError(-32099)));
        assert_eq!(ErrorCode::from_code(-32100), None);
        assert_eq!(ErrorCode::from_code(3), None);

        for code in [-32700, -32600, -32601, -32602, -32603, -32050] {
            assert_eq!(ErrorCode::from_code(code).unwrap().code(), code);
        }
    }

    #[test]
    fn test_payload_is_kept_verbatim() {
        let raw = json!({
            "code": 3,
            "message": "execution reverted",
            "data": "0x08c379a0",
            "reason": "insufficient balance"
        });

        let err: ErrorObject = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(err.code(), Some(3));
        assert_eq!(err.data(), Some(&json!("0x08c379a0")));
        assert_eq!(err.get("reason"), Some(&json!("insufficient balance")));
        assert_eq!(serde_json::to_value(&err).unwrap(), raw);
    }

    #[test]
    fn test_null_data_survives() {
        let raw = json!({"code": -32000, "message": "x", "data": null});

        let err: ErrorObject = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(err.data(), Some(&Value::Null));
        assert_eq!(serde_json::to_value(&err).unwrap(), raw);
    }

    #[test]
    fn test_incomplete_payloads_are_accepted() {
        let err: ErrorObject = serde_json::from_value(json!({"code": -32601})).unwrap();
        assert_eq!(err.code(), Some(-32601));
        assert_eq!(err.message(), None);
        assert_eq!(err.to_string(), "error code -32601");

        let err: ErrorObject = serde_json::from_value(json!({"message": "boom", "code": "E1"})).unwrap();
        assert_eq!(err.code(), None);
        assert_eq!(err.standard_code(), None);
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        assert!(serde_json::from_value::<ErrorObject>(json!("boom")).is_err());
        assert!(serde_json::from_value::<ErrorObject>(Value::Null).is_err());
    }

    #[test]
    fn test_from_error_code() {
        let err = ErrorObject::from(ErrorCode::MethodNotFound);
        assert_eq!(err.code(), Some(-32601));
        assert_eq!(err.message(), Some("method not found"));
        assert_eq!(err.standard_code(), Some(ErrorCode::MethodNotFound));
        assert_eq!(err.to_string(), "method not found (-32601)");
    }
}
