//! LightLock - persistent two-tier lighting cache
//!
//! Memoizes expensive per-sample lighting results (a color plus a weight)
//! under caller-derived 64-bit keys. Baked results live in a permanent tier
//! that survives sector invalidation; results discovered at runtime live in a
//! dynamic tier that is flushed when geometry changes. Both tiers are bounded
//! and are persisted together to a single binary file.

pub mod cache;
pub mod config;
pub mod key;

pub use cache::{CacheStats, LightCache, LoadSummary, PersistResult, PersistenceError};
pub use config::{CacheConfig, ConfigError, ConfigResult, LayeredConfig};
pub use key::{lightmap_key, world_space_key};
pub use lightlock_format::{CacheEntry, DynamicEntry, FormatError, Rgb};
