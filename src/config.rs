//! # Fetch Configuration
//!
//! A configuration file describes one fetch: what to load, where the `file` kind is
//! rooted, and where (if anywhere) to write the resulting table. JSON and YAML are both
//! accepted; the format is picked from the file extension.
//!
//! ```yaml
//! request:
//!   type: dataset
//!   name: neiv-nova-test
//!   params:
//!     parameter: forecast_error
//! base_dir: fixtures
//! output: forecast_error.parquet
//! ```
//!
//! ```json
//! {
//!   "request": { "type": "source", "kind": "url", "locator": "https://example.org/tracks.csv" },
//!   "output": "s3://bucket/tracks.parquet"
//! }
//! ```

use crate::source::SourceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported config extension for {0}, expected .json, .yaml or .yml")]
    UnsupportedFormat(String),
}

/// One fetch job
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct FetchConfig {
    pub request: RequestConfig,

    /// Where to write the table (local path or s3://), by extension .parquet or .csv
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Working directory for `file` sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Number of rows to print after loading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<usize>,
}

/// What to load
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestConfig {
    /// A raw `(kind, locator)` pair
    Source { kind: SourceKind, locator: String },
    /// A short name from the catalog of known sources
    Named { name: String },
    /// A registered dataset plus its parameters
    Dataset {
        name: String,
        #[serde(default)]
        params: BTreeMap<String, String>,
    },
}

impl RequestConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            RequestConfig::Source { .. } => "source",
            RequestConfig::Named { .. } => "named",
            RequestConfig::Dataset { .. } => "dataset",
        }
    }

    /// One-line human description, used in console echoes
    pub fn describe(&self) -> String {
        match self {
            RequestConfig::Source { kind, locator } => format!("{} source {}", kind, locator),
            RequestConfig::Named { name } => format!("named source {}", name),
            RequestConfig::Dataset { name, params } => {
                let rendered: Vec<String> =
                    params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                format!("dataset {} ({})", name, rendered.join(", "))
            }
        }
    }
}

impl FetchConfig {
    pub fn new(request: RequestConfig) -> Self {
        Self {
            request,
            output: None,
            base_dir: None,
            log_level: None,
            preview: None,
        }
    }

    /// Loads a configuration file, JSON or YAML by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => Self::from_json(&content),
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml_str)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
