//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

use crate::client::channel::DEFAULT_MAX_LINE_BYTES;

/// How to reach the peer when running from the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Peer command whose stdin/stdout carry the JSON lines (empty = unset)
    #[serde(default)]
    pub command: Vec<String>,

    /// Longest response line accepted, in bytes
    pub max_line_bytes: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print results (default: true)
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// env_logger filter used when RUST_LOG is unset (default: "warn")
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}
