//! Two-tier lighting cache
//!
//! - `tier`: a fixed-capacity FIFO map
//! - `stats`: activity counters and the [`CacheStats`] snapshot
//! - `persist`: atomic cache file I/O
//! - `light_cache`: the thread-safe [`LightCache`] built on the above

mod light_cache;
mod persist;
mod stats;
mod tier;

pub use light_cache::{LightCache, LoadSummary};
pub use persist::{read_snapshot_file, write_snapshot_file, PersistResult, PersistenceError};
pub use stats::CacheStats;
