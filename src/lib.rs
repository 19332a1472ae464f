//! xeth - native JSON-RPC interface to a remote node
//!
//! A synchronous JSON-RPC 2.0 call client. A caller hands it a method name and
//! positional parameters; it builds a correlated request, sends it over an
//! injected [`Channel`], waits for the single matching response and returns
//! either the result object or a typed [`CallError`].

pub mod client;
pub mod config;
pub mod mock;

pub use client::{CallError, CallResult, Channel, ChannelError, RpcClient, StreamChannel};
pub use config::{Config, ConfigError};
pub use xeth_protocol::{ErrorCode, ErrorObject, Request, Response};
