use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Limits applied across the pipeline. Components receiving no explicit
/// config fall back to these defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_identifier_length: usize,
    pub max_string_length: usize,
    pub max_comment_length: usize,
    pub max_number_length: usize,
    pub max_func_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_identifier_length: 128,
            max_string_length: 256,
            max_comment_length: 256,
            max_number_length: 128,
            max_func_depth: 50,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
