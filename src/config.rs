//! Configuration for a plan service.
//!
//! Every field has a default, so an empty document is a valid config:
//!
//! ```toml
//! ttl_secs = 25200        # 0 disables expiry
//! topic = "plans_queue"
//! list_pattern = "*"
//! search_index = "plans"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid TOML for this config
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds an unusable value
    #[error("invalid config field {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: &'static str,
    },
}

/// Plan service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanStoreConfig {
    /// Lifetime of every stored record in seconds; 0 keeps records forever
    pub ttl_secs: u64,
    /// Topic change events are published to
    pub topic: String,
    /// Key pattern scanned when listing plans (`glob` syntax: `*`, `?`, `[a-z]`, `[!a]`)
    pub list_pattern: String,
    /// Name of the search index queried by `search`
    pub search_index: String,
}

impl Default for PlanStoreConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 7 * 60 * 60,
            topic: "plans_queue".to_string(),
            list_pattern: "*".to_string(),
            search_index: "plans".to_string(),
        }
    }
}

impl PlanStoreConfig {
    /// Parse and validate a TOML document
    ///
    /// # Example
    ///
    /// ```
    /// use planstore::PlanStoreConfig;
    ///
    /// let config = PlanStoreConfig::from_toml_str("ttl_secs = 60").unwrap();
    /// assert_eq!(config.ttl_secs, 60);
    /// assert_eq!(config.topic, "plans_queue");
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: PlanStoreConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check that every field is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topic.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "topic",
                reason: "must not be empty",
            });
        }
        if self.list_pattern.is_empty() {
            return Err(ConfigError::Invalid {
                field: "list_pattern",
                reason: "must not be empty",
            });
        }
        if self.search_index.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "search_index",
                reason: "must not be empty",
            });
        }
        Ok(())
    }

    /// Record TTL, or `None` when expiry is disabled
    pub fn ttl(&self) -> Option<Duration> {
        match self.ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
