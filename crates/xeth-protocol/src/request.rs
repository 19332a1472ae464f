//! JSON-RPC request envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version marker.
///
/// Only `"2.0"` is representable, so a request can never carry another version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Version {
    #[default]
    #[serde(rename = "2.0")]
    V2,
}

impl Version {
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::V2 => crate::JSONRPC_VERSION,
        }
    }
}

/// Request envelope.
///
/// Field order matches the wire form:
/// `{"id":..,"jsonrpc":"2.0","method":..,"params":[..]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Client-allocated id used to correlate the response.
    pub id: u32,
    /// Always `"2.0"`.
    pub jsonrpc: Version,
    /// Remote method name.
    pub method: String,
    /// Positional parameters, serialized as a JSON array.
    pub params: Value,
}

impl Request {
    /// Build a request for the given id, method and already-serialized params.
    pub fn new(id: u32, method: impl Into<String>, params: Value) -> Self {
        Self {
            id,
            jsonrpc: Version::V2,
            method: method.into(),
            params,
        }
    }

    /// Number of positional parameters (0 when params is not an array).
    pub fn arity(&self) -> usize {
        self.params.as_array().map(Vec::len).unwrap_or(0)
    }
}
