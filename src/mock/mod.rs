//! Mock Channel Implementation
//!
//! In-process stand-in for a JSON-RPC peer, used by unit and integration
//! tests. Supports failure injection for testing transport error paths.

mod channel;
mod failure;

pub use channel::MockChannel;
pub use failure::{ChannelFailure, Direction, FailureConfig, FailureInjector};
