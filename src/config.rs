//! Engine configuration
//!
//! Loaded from a JSON file. Every field except `policy` has a default, so
//! `{}` is a valid configuration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::LogLevel;
use crate::policy::PolicyConfig;
use crate::query::{DEFAULT_LIMIT, DEFAULT_TIMEOUT_MS};
use crate::router::{DEFAULT_EMBEDDED_SLOTS, DEFAULT_POOL_SIZE};
use crate::statement::{is_identifier, DEFAULT_TENANT_COLUMN};
use crate::validator::DEFAULT_MAX_LIMIT;

/// Configuration load or validation failure
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TQL_CONFIG_READ: failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("TQL_CONFIG_PARSE: invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("TQL_CONFIG_INVALID: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "TQL_CONFIG_READ",
            ConfigError::Parse(_) => "TQL_CONFIG_PARSE",
            ConfigError::Invalid(_) => "TQL_CONFIG_INVALID",
        }
    }

    fn invalid(msg: impl Into<String>) -> Self {
        ConfigError::Invalid(msg.into())
    }
}

/// Engine configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Column every relation is partitioned on
    #[serde(default = "default_tenant_column")]
    pub tenant_column: String,

    /// Limit used when a request sets none
    #[serde(default = "default_limit")]
    pub default_limit: i64,

    /// Largest limit a request may ask for
    #[serde(default = "default_max_limit")]
    pub max_limit: i64,

    /// Per-attempt deadline used when a request sets none
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// trace, info, warn or error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_pool_size")]
    pub relational_pool_size: usize,

    /// When false the embedded backend is never opened
    #[serde(default = "default_embedded_enabled")]
    pub embedded_enabled: bool,

    /// Embedded engine calls allowed to hold a blocking thread at once
    #[serde(default = "default_embedded_slots")]
    pub embedded_max_in_flight: usize,

    #[serde(default)]
    pub policy: PolicyConfig,
}

fn default_tenant_column() -> String {
    DEFAULT_TENANT_COLUMN.to_string()
}
fn default_limit() -> i64 {
    DEFAULT_LIMIT
}
fn default_max_limit() -> i64 {
    DEFAULT_MAX_LIMIT
}
fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_pool_size() -> usize {
    DEFAULT_POOL_SIZE
}
fn default_embedded_enabled() -> bool {
    true
}
fn default_embedded_slots() -> usize {
    DEFAULT_EMBEDDED_SLOTS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tenant_column: default_tenant_column(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            default_timeout_ms: default_timeout_ms(),
            log_level: default_log_level(),
            relational_pool_size: default_pool_size(),
            embedded_enabled: default_embedded_enabled(),
            embedded_max_in_flight: default_embedded_slots(),
            policy: PolicyConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_identifier(&self.tenant_column) || self.tenant_column.contains('.') {
            return Err(ConfigError::invalid(format!(
                "tenant_column '{}' must be a plain identifier",
                self.tenant_column
            )));
        }

        if self.max_limit <= 0 {
            return Err(ConfigError::invalid("max_limit must be > 0"));
        }

        if self.default_limit < 0 || self.default_limit > self.max_limit {
            return Err(ConfigError::invalid(format!(
                "default_limit must be between 0 and max_limit ({})",
                self.max_limit
            )));
        }

        if self.default_timeout_ms == 0 {
            return Err(ConfigError::invalid("default_timeout_ms must be > 0"));
        }

        if self.relational_pool_size == 0 {
            return Err(ConfigError::invalid("relational_pool_size must be > 0"));
        }

        if self.embedded_max_in_flight == 0 {
            return Err(ConfigError::invalid("embedded_max_in_flight must be > 0"));
        }

        self.log_level()?;

        Ok(())
    }

    /// Parsed `log_level`
    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }
}
