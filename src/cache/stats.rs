//! Cache statistics

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Lock-free counters updated on every operation.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    queries: AtomicU64,
    permanent_hits: AtomicU64,
    dynamic_hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    evictions: AtomicU64,
    sector_invalidations: AtomicU64,
}

/// Which tier answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
    Permanent,
    Dynamic,
    Miss,
}

impl Counters {
    pub(crate) fn record_lookup(&self, lookup: Lookup) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let counter = match lookup {
            Lookup::Permanent => &self.permanent_hits,
            Lookup::Dynamic => &self.dynamic_hits,
            Lookup::Miss => &self.misses,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_store(&self, evicted: bool) {
        self.stores.fetch_add(1, Ordering::Relaxed);
        if evicted {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_sector_invalidation(&self) {
        self.sector_invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        for counter in [
            &self.queries,
            &self.permanent_hits,
            &self.dynamic_hits,
            &self.misses,
            &self.stores,
            &self.evictions,
            &self.sector_invalidations,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Fill the counter fields of `stats`.
    pub(crate) fn fill(&self, stats: &mut CacheStats) {
        stats.total_queries = self.queries.load(Ordering::Relaxed);
        stats.permanent_hits = self.permanent_hits.load(Ordering::Relaxed);
        stats.dynamic_hits = self.dynamic_hits.load(Ordering::Relaxed);
        stats.misses = self.misses.load(Ordering::Relaxed);
        stats.stores = self.stores.load(Ordering::Relaxed);
        stats.evictions = self.evictions.load(Ordering::Relaxed);
        stats.sector_invalidations = self.sector_invalidations.load(Ordering::Relaxed);
    }
}

/// Point-in-time view of cache sizes and activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub permanent_count: usize,
    pub permanent_capacity: usize,
    pub dynamic_count: usize,
    pub dynamic_capacity: usize,
    pub total_queries: u64,
    pub permanent_hits: u64,
    pub dynamic_hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub evictions: u64,
    pub sector_invalidations: u64,
}

impl CacheStats {
    /// Lookups answered by either tier.
    pub fn hits(&self) -> u64 {
        self.permanent_hits + self.dynamic_hits
    }

    /// Fraction of lookups that hit, in `[0, 1]`. Zero when nothing was queried.
    pub fn hit_rate(&self) -> f64 {
        if self.total_queries == 0 {
            0.0
        } else {
            self.hits() as f64 / self.total_queries as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "LightLock stats:")?;
        writeln!(
            f,
            "Permanent: {}/{} | Dynamic: {}/{}",
            self.permanent_count, self.permanent_capacity, self.dynamic_count, self.dynamic_capacity
        )?;
        writeln!(f, "Hit rate: {:.1}%", self.hit_rate() * 100.0)?;
        writeln!(f, "Queries: {} | Misses: {}", self.total_queries, self.misses)?;
        writeln!(f, "Stores: {} | Evictions: {}", self.stores, self.evictions)?;
        write!(f, "Sector invalidations: {}", self.sector_invalidations)
    }
}
