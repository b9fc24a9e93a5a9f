//! Built-in cache defaults (layer 1)
//!
//! Hardcoded defaults for all configuration values.

use serde::{Deserialize, Serialize};

/// Default permanent-tier capacity.
pub const ST_MAX: usize = 2_097_152;

/// Default dynamic-tier capacity.
pub const DYN_MAX: usize = 524_288;

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Permanent tier capacity (default: 2,097,152 entries)
    pub permanent_capacity: usize,

    /// Dynamic tier capacity (default: 524,288 entries)
    pub dynamic_capacity: usize,

    /// Cache file path (default: "lightlock.bin")
    pub cache_path: String,

    /// Write the cache back when it is dropped (default: true)
    pub persist_on_drop: bool,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            permanent_capacity: ST_MAX,
            dynamic_capacity: DYN_MAX,
            cache_path: lightlock_format::DEFAULT_FILE_NAME.to_string(),
            persist_on_drop: true,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "permanent_capacity": self.permanent_capacity,
            "dynamic_capacity": self.dynamic_capacity,
            "cache_path": self.cache_path,
            "persist_on_drop": self.persist_on_drop
        })
    }
}
