//! Configuration layering
//!
//! Merges up to four layers, later ones winning:
//! 1. Built-in defaults
//! 2. User config (`$XDG_CONFIG_HOME/xeth/config.toml` or `~/.config/xeth/config.toml`)
//! 3. Config file passed with `--config`
//! 4. CLI flags

mod defaults;
mod merge;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use defaults::{EndpointConfig, LogConfig, OutputConfig};
pub use merge::{deep_merge, merge_layers, toml_to_json};

/// Effective configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Location of the per-user config file, if a home can be determined
    pub fn user_path() -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
            return Some(PathBuf::from(dir).join("xeth/config.toml"));
        }
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config/xeth/config.toml"))
    }

    /// Build the effective config from all layers.
    ///
    /// A missing user file is skipped; a missing explicit file is an error.
    /// `overrides` is a JSON object shaped like the config; nulls in it leave
    /// the lower layers untouched.
    pub fn load(
        user_path: Option<&Path>,
        explicit_path: Option<&Path>,
        overrides: Value,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![Self::default().to_value()];

        if let Some(path) = user_path.filter(|p| p.exists()) {
            layers.push(read_layer(path)?);
        }

        if let Some(path) = explicit_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            layers.push(read_layer(path)?);
        }

        layers.push(overrides);

        Self::from_value(merge_layers(layers))
    }

    /// Parse a single TOML document on top of the defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let layer = parse_layer(contents, Path::new("<string>"))?;
        Self::from_value(merge_layers([Self::default().to_value(), layer]))
    }

    fn from_value(value: Value) -> Result<Self, ConfigError> {
        let config: Config =
            serde_json::from_value(value).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.max_line_bytes == 0 {
            return Err(ConfigError::Invalid(
                "endpoint.max_line_bytes must be greater than 0".to_string(),
            ));
        }
        if self.endpoint.command.first().is_some_and(|program| program.is_empty()) {
            return Err(ConfigError::Invalid(
                "endpoint.command must start with a program name".to_string(),
            ));
        }
        Ok(())
    }

    /// JSON form, as merged and as printed by `xeth config`
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "endpoint": {
                "command": self.endpoint.command,
                "max_line_bytes": self.endpoint.max_line_bytes,
            },
            "output": {
                "pretty": self.output.pretty,
            },
            "log": {
                "level": self.log.level,
            },
        })
    }
}

fn read_layer(path: &Path) -> Result<Value, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_layer(&contents, path)
}

fn parse_layer(contents: &str, path: &Path) -> Result<Value, ConfigError> {
    let doc: toml::Value = toml::from_str(contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(toml_to_json(doc))
}
