//! Configuration for Gatehouse
//!
//! Centralized configuration with sensible defaults.

use crate::error::{GatehouseError, Result};

/// Default storage key prefix. Existing deployments and the legacy
/// migration depend on it, so changing it orphans stored data.
pub const DEFAULT_KEY_PREFIX: &str = "statsig";

/// Default unit id type for new entities and rules
pub const DEFAULT_ID_TYPE: &str = "userID";

/// Main configuration for an [`Engine`](crate::Engine)
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Prefix of every storage key:
    ///   {key_prefix}:gate:{hash}
    ///   {key_prefix}:entities:{hash}
    ///   {key_prefix}:{hash}:targetApps
    ///   ...
    pub key_prefix: String,

    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    /// Serve config specs through the specs cache. Disabling it only changes
    /// latency, never results.
    pub specs_cache_enabled: bool,

    // -------------------------------------------------------------------------
    // Entity Defaults
    // -------------------------------------------------------------------------
    /// Unit id type assigned to entities created without one
    pub default_id_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            specs_cache_enabled: true,
            default_id_type: DEFAULT_ID_TYPE.to_string(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the config for values that would corrupt the key space
    pub fn validate(&self) -> Result<()> {
        if self.key_prefix.is_empty() {
            return Err(GatehouseError::Config("key prefix must not be empty".to_string()));
        }
        if self.key_prefix.contains(':') {
            return Err(GatehouseError::Config(format!(
                "key prefix must not contain ':' (got {:?})",
                self.key_prefix
            )));
        }
        if self.default_id_type.is_empty() {
            return Err(GatehouseError::Config("default id type must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the storage key prefix
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into();
        self
    }

    /// Enable or disable the specs cache
    pub fn specs_cache_enabled(mut self, enabled: bool) -> Self {
        self.config.specs_cache_enabled = enabled;
        self
    }

    /// Set the default unit id type for new entities
    pub fn default_id_type(mut self, id_type: impl Into<String>) -> Self {
        self.config.default_id_type = id_type.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
