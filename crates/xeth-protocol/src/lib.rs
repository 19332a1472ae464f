//! xeth Protocol Types
//!
//! Defines the JSON-RPC 2.0 envelope exchanged between the call client and a
//! remote peer.

pub mod codec;
pub mod error;
pub mod request;
pub mod response;

pub use codec::CodecError;
pub use error::{ErrorCode, ErrorObject};
pub use request::{Request, Version};
pub use response::{ErrorResponse, Response, SuccessResponse};

/// Protocol version string carried in every request.
pub const JSONRPC_VERSION: &str = "2.0";
