//! Cache configuration with layered sources
//!
//! The effective configuration is built from:
//! 1. Built-in defaults
//! 2. An optional TOML file (e.g. `lightlock.toml`)
//! 3. Programmatic or CLI overrides (a JSON object)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::defaults::BuiltinDefaults;
use super::merge::{merge_layers, toml_to_json};

/// Config result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors from configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation error: {0}")]
    Invalid(String),
}

/// Settings for a [`LightCache`](crate::LightCache).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum entries in the permanent tier
    pub permanent_capacity: usize,
    /// Maximum entries in the dynamic tier
    pub dynamic_capacity: usize,
    /// Backing file for both tiers
    pub cache_path: PathBuf,
    /// Save to `cache_path` when the cache is dropped
    pub persist_on_drop: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let defaults = BuiltinDefaults::default();
        Self {
            permanent_capacity: defaults.permanent_capacity,
            dynamic_capacity: defaults.dynamic_capacity,
            cache_path: PathBuf::from(defaults.cache_path),
            persist_on_drop: defaults.persist_on_drop,
        }
    }
}

impl CacheConfig {
    /// Default capacities, backed by `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: path.into(),
            ..Self::default()
        }
    }

    /// Override both tier capacities.
    pub fn with_capacities(mut self, permanent: usize, dynamic: usize) -> Self {
        self.permanent_capacity = permanent;
        self.dynamic_capacity = dynamic;
        self
    }

    /// Enable or disable the save performed on drop.
    pub fn with_persist_on_drop(mut self, enabled: bool) -> Self {
        self.persist_on_drop = enabled;
        self
    }

    /// Parse a TOML document layered over the built-in defaults.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let toml_value: toml::Value = toml::from_str(contents)?;
        Self::from_layers(vec![BuiltinDefaults::default().to_value(), toml_to_json(toml_value)])
    }

    /// Build the effective configuration from an optional TOML file and
    /// optional overrides.
    ///
    /// A file path that does not exist is skipped.
    pub fn load(file: Option<&Path>, overrides: Option<Value>) -> ConfigResult<LayeredConfig> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
        }];

        if let Some(path) = file {
            if path.exists() {
                layers.push(load_toml_file(path)?);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::File,
                    path: Some(path.to_path_buf()),
                });
            }
        }

        if let Some(overrides) = overrides {
            layers.push(overrides);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Overrides,
                path: None,
            });
        }

        Ok(LayeredConfig {
            config: Self::from_layers(layers)?,
            sources,
        })
    }

    /// Check values that deserialize but cannot be used.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.permanent_capacity == 0 {
            return Err(ConfigError::Invalid(
                "permanent_capacity must be at least 1".to_string(),
            ));
        }
        if self.dynamic_capacity == 0 {
            return Err(ConfigError::Invalid(
                "dynamic_capacity must be at least 1".to_string(),
            ));
        }
        if self.cache_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("cache_path must not be empty".to_string()));
        }
        Ok(())
    }

    fn from_layers(layers: Vec<Value>) -> ConfigResult<Self> {
        let config: Self = serde_json::from_value(merge_layers(layers))?;
        config.validate()?;
        Ok(config)
    }
}

/// Where a configuration layer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Overrides,
}

/// A contributing configuration layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Effective configuration plus the layers that produced it, in precedence
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayeredConfig {
    pub config: CacheConfig,
    pub sources: Vec<ConfigSource>,
}

fn load_toml_file(path: &Path) -> ConfigResult<Value> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let toml_value: toml::Value = toml::from_str(&contents)?;
    Ok(toml_to_json(toml_value))
}
