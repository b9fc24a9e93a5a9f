//! Configuration system
//!
//! Implements the 3-layer configuration merge:
//! 1. Built-in defaults
//! 2. TOML file (`lightlock.toml`)
//! 3. Programmatic / CLI overrides

mod cache_config;
mod defaults;
mod merge;

pub use cache_config::{
    CacheConfig, ConfigError, ConfigOrigin, ConfigResult, ConfigSource, LayeredConfig,
};
pub use defaults::{BuiltinDefaults, DYN_MAX, ST_MAX};
pub use merge::{deep_merge, merge_layers, toml_to_json};
