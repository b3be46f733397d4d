//! `csweep.jsonc` configuration.
//!
//! ```jsonc
//! {
//!   // kept in addition to the built-in rules
//!   "rules": [{ "name": "region", "pattern": "#(end)?region", "priority": 950 }],
//!   "logCalls": ["console.log", "logger.debug"],
//!   "include": ["src/**/*.ts"],
//!   "exclude": ["**/vendor/**"]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::lexer::LexError;
use crate::lexer::legacy::strip_comments;
use crate::logs::DEFAULT_LOG_CALLEES;
use crate::preserve::{CUSTOM_PRIORITY, RuleEngine, RuleError};

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "csweep.jsonc";

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Comments could not be stripped from the file.
    #[error("failed to strip comments from configuration")]
    Comments(#[from] LexError),
    /// The text is not valid JSON for [`Config`].
    #[error("invalid configuration: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// A custom rule pattern does not compile.
    #[error(transparent)]
    InvalidRule(#[from] RuleError),
}

/// A caller-supplied preservation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CustomRule {
    /// Rule name.
    pub name: String,
    /// Case-insensitive regular expression.
    pub pattern: String,
    /// Defaults to [`CUSTOM_PRIORITY`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parsed configuration. Every field is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Extra preservation rules.
    #[serde(default)]
    pub rules: Vec<CustomRule>,
    /// Callees removed by `strip-logs`; empty means [`DEFAULT_LOG_CALLEES`].
    #[serde(default)]
    pub log_calls: Vec<String>,
    /// Globs selecting files when walking directories.
    #[serde(default)]
    pub include: Vec<String>,
    /// Globs excluded when walking directories.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Config {
    /// Built-in rules plus every custom rule, in file order.
    pub fn rule_engine(&self) -> Result<RuleEngine, RuleError> {
        let mut engine = RuleEngine::new();
        for rule in &self.rules {
            engine.add_rule(
                rule.name.clone(),
                &rule.pattern,
                rule.priority.unwrap_or(CUSTOM_PRIORITY),
                rule.description.clone().unwrap_or_else(|| "custom rule".to_string()),
            )?;
        }
        Ok(engine)
    }

    /// Callees for log stripping.
    pub fn log_callees(&self) -> Vec<&str> {
        if self.log_calls.is_empty() {
            DEFAULT_LOG_CALLEES.to_vec()
        } else {
            self.log_calls.iter().map(String::as_str).collect()
        }
    }
}

/// Parse JSONC text. Custom rule patterns are compiled to reject bad ones early.
pub fn load_config_from_str(text: &str) -> Result<Config, ConfigError> {
    let json = strip_comments(text)?;
    let config: Config = serde_json::from_str(&json)?;
    config.rule_engine()?;
    Ok(config)
}

/// Read and parse a configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("loaded configuration from {}", path.display());
    load_config_from_str(&text)
}
