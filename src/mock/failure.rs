//! Failure Injection for Mock Channel
//!
//! Supports configurable send/receive failures for testing error paths.

use std::collections::HashMap;

use crate::client::ChannelError;

/// Direction of a channel operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Send,
    Receive,
}

/// Kind of failure to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelFailure {
    /// Peer went away
    Closed,
    /// Operation timed out
    Timeout,
    /// Write to a closed pipe
    BrokenPipe,
}

impl ChannelFailure {
    /// Build the error a real channel would return
    pub fn to_error(self) -> ChannelError {
        match self {
            ChannelFailure::Closed => ChannelError::Closed,
            ChannelFailure::Timeout => ChannelError::Timeout,
            ChannelFailure::BrokenPipe => ChannelError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock: broken pipe",
            )),
        }
    }
}

/// Failure configuration for one direction
#[derive(Debug, Clone)]
pub struct FailureConfig {
    pub failure: ChannelFailure,
    /// Number of times to fail before succeeding (None = always fail)
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    /// Create a config that returns an error
    pub fn error(failure: ChannelFailure) -> Self {
        Self {
            failure,
            fail_count: None,
        }
    }

    /// Set the number of times to fail before succeeding
    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }
}

/// Failure injector for the mock channel
#[derive(Debug, Default)]
pub struct FailureInjector {
    configs: HashMap<Direction, FailureConfig>,
    call_counts: HashMap<Direction, u32>,
}

impl FailureInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a failure for a direction
    pub fn inject(&mut self, direction: Direction, config: FailureConfig) {
        self.configs.insert(direction, config);
        self.call_counts.insert(direction, 0);
    }

    pub fn inject_error(&mut self, direction: Direction, failure: ChannelFailure) {
        self.inject(direction, FailureConfig::error(failure));
    }

    /// Returns the failure to produce for this call, if any
    pub fn check(&mut self, direction: Direction) -> Option<ChannelFailure> {
        let config = self.configs.get(&direction)?;
        let count = self.call_counts.entry(direction).or_insert(0);
        *count += 1;

        if let Some(fail_limit) = config.fail_count {
            if *count > fail_limit {
                return None;
            }
        }

        Some(config.failure)
    }
}
