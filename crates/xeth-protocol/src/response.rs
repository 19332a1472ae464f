//! JSON-RPC response envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorObject;
use crate::request::Version;

/// Successful response: `{"id":..,"result":..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<Version>,
    pub id: u32,
    pub result: Value,
}

/// Failed response: `{"id":..,"error":{..}}`.
///
/// `id` is `None` when the member is `null` or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<Version>,
    pub id: Option<u32>,
    pub error: ErrorObject,
}

/// A decoded response envelope.
///
/// Variants are tried in order, so an envelope whose `error` member is an
/// object is always an error. Anything matching neither shape lands in
/// `Unknown` with the raw JSON preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Error(ErrorResponse),
    Success(SuccessResponse),
    Unknown(Value),
}

impl Response {
    /// Create a success response.
    pub fn success(id: u32, result: Value) -> Self {
        Response::Success(SuccessResponse {
            jsonrpc: Some(Version::V2),
            id,
            result,
        })
    }

    /// Create an error response.
    pub fn error(id: Option<u32>, error: ErrorObject) -> Self {
        Response::Error(ErrorResponse {
            jsonrpc: Some(Version::V2),
            id,
            error,
        })
    }

    /// The correlation id, if the envelope carries a usable one.
    pub fn id(&self) -> Option<u32> {
        match self {
            Response::Success(success) => Some(success.id),
            Response::Error(failure) => failure.id,
            Response::Unknown(_) => None,
        }
    }

    /// Short description of the envelope shape, used in diagnostics.
    pub fn shape(&self) -> String {
        match self {
            Response::Success(_) => "success response".to_string(),
            Response::Error(_) => "error response".to_string(),
            Response::Unknown(Value::Object(map)) => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                format!("object with members [{}]", keys.join(", "))
            }
            Response::Unknown(other) => value_kind(other).to_string(),
        }
    }
}

/// JSON type name of a value.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
