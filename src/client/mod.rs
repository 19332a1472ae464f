//! Client-Side Components
//!
//! The call client and the channel abstraction it talks through.

pub mod channel;
pub mod rpc;

pub use channel::{Channel, ChannelError, StreamChannel};
pub use rpc::{CallError, CallResult, FailureKind, ProtocolViolation, RpcClient, Stage};
