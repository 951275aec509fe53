//! Configuration for pycensus runs.
//!
//! A configuration file is optional. When present it is a small YAML
//! document; every field has a default so an empty file is valid:
//!
//! ```yaml
//! extensions: [py]
//! excluded_paths: ["**/migrations/**", "build/**"]
//! on_parse_error: abort      # or: skip
//! on_unhandled_call: record  # or: fail
//! parallel: true
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Config file names looked up in the current directory.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["pycensus.yaml", ".pycensus.yaml"];

/// What to do when a source file fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseErrorPolicy {
    /// Stop the whole run on the first unparseable file.
    #[default]
    Abort,
    /// Record the failure in the report and continue with the next file.
    Skip,
}

/// What to do with a call whose callee shape is not classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnhandledCallPolicy {
    /// Log it and list it in the report's unclassified calls.
    #[default]
    Record,
    /// Fail the file with an `UnhandledCallShape` error.
    Fail,
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Source file extensions without the dot, matched case-insensitively.
    pub extensions: Vec<String>,
    /// Glob patterns, relative to the analyzed root, for paths to skip.
    pub excluded_paths: Vec<String>,
    pub on_parse_error: ParseErrorPolicy,
    pub on_unhandled_call: UnhandledCallPolicy,
    /// Parse and walk files on the rayon thread pool.
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: vec!["py".to_string()],
            excluded_paths: Vec::new(),
            on_parse_error: ParseErrorPolicy::default(),
            on_unhandled_call: UnhandledCallPolicy::default(),
            parallel: true,
        }
    }
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&content)
    }

    /// Parse a configuration from YAML text. Blank input yields the defaults.
    pub fn parse_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Look for a default config file in `dir`.
    pub fn discover_in(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extensions.iter().all(|e| e.trim_start_matches('.').is_empty()) {
            return Err(ConfigError::NoExtensions);
        }
        for pattern in &self.excluded_paths {
            globset::Glob::new(pattern)?;
        }
        Ok(())
    }
}
