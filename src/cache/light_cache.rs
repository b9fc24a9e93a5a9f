//! The two-tier lighting cache.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use lightlock_format::{CacheEntry, DynamicEntry, Rgb};
use tracing::{debug, info, trace, warn};

use super::persist::{self, PersistResult, PersistenceError};
use super::stats::{CacheStats, Counters, Lookup};
use super::tier::Tier;
use crate::config::CacheConfig;

/// Both tiers, guarded together by one lock.
#[derive(Debug)]
struct Tiers {
    permanent: Tier<CacheEntry>,
    dynamic: Tier<DynamicEntry>,
}

/// Result of a successful [`LightCache::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Permanent entries now resident
    pub permanent: usize,
    /// Dynamic entries now resident
    pub dynamic: usize,
    /// Records evicted during load because the file exceeded a tier capacity
    pub evicted: usize,
}

/// Fixed-capacity, persistent cache of per-sample lighting results.
///
/// Keys are 64-bit hashes derived by the caller. Results live in one of two
/// tiers:
/// - **permanent**: baked data that survives sector invalidation
/// - **dynamic**: runtime-discovered data, dropped wholesale by
///   [`invalidate_sector`](Self::invalidate_sector)
///
/// Lookups consult the permanent tier first. A full tier evicts its oldest
/// key (FIFO by first insertion) before taking a new one.
///
/// All methods take `&self`; share the cache across threads with a reference
/// or an `Arc`. When `persist_on_drop` is set the cache writes itself back to
/// its file when dropped, but only once it has read from or written to that
/// file: a cache built with [`new`](Self::new) and never loaded or saved
/// leaves the file alone.
#[derive(Debug)]
pub struct LightCache {
    config: CacheConfig,
    tiers: RwLock<Tiers>,
    counters: Counters,
    /// Set once `load` or `save` has touched the backing file.
    file_bound: AtomicBool,
    /// The most recent `load` found a file it could not accept.
    load_rejected: AtomicBool,
}

impl LightCache {
    /// Create an empty cache without touching the backing file.
    ///
    /// Dropping it does not save unless [`load`](Self::load) or
    /// [`save`](Self::save) was called first.
    pub fn new(config: CacheConfig) -> Self {
        let tiers = Tiers {
            permanent: Tier::with_capacity(config.permanent_capacity),
            dynamic: Tier::with_capacity(config.dynamic_capacity),
        };
        Self {
            config,
            tiers: RwLock::new(tiers),
            counters: Counters::default(),
            file_bound: AtomicBool::new(false),
            load_rejected: AtomicBool::new(false),
        }
    }

    /// Create a cache and populate it from `config.cache_path`.
    ///
    /// Never fails: a missing or unreadable file yields an empty cache.
    pub fn open(config: CacheConfig) -> Self {
        let cache = Self::new(config);
        match cache.load() {
            Ok(summary) => info!(
                path = %cache.path().display(),
                permanent = summary.permanent,
                dynamic = summary.dynamic,
                "Loaded light cache"
            ),
            Err(PersistenceError::NotFound(path)) => {
                info!(path = %path.display(), "No light cache file, starting cold")
            }
            Err(e) => warn!(error = %e, "Ignoring light cache file, starting cold"),
        }
        cache
    }

    /// The configuration this cache was created with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.config.cache_path
    }

    /// Look up `hash`, permanent tier first.
    pub fn hit(&self, hash: u64) -> Option<CacheEntry> {
        let found = {
            let tiers = self.read();
            if let Some(entry) = tiers.permanent.get(hash) {
                Some((*entry, Lookup::Permanent))
            } else {
                tiers
                    .dynamic
                    .get(hash)
                    .map(|dynamic| (dynamic.entry, Lookup::Dynamic))
            }
        };

        match found {
            Some((entry, tier)) => {
                self.counters.record_lookup(tier);
                Some(entry)
            }
            None => {
                self.counters.record_lookup(Lookup::Miss);
                None
            }
        }
    }

    /// Insert or overwrite `hash` in the permanent or dynamic tier.
    ///
    /// The other tier is not touched, so a key may live in both.
    pub fn store(&self, hash: u64, color: Rgb, weight: f32, permanent: bool) {
        let entry = CacheEntry::new(color, weight);
        let evicted = {
            let mut tiers = self.write();
            if permanent {
                tiers.permanent.insert(hash, entry)
            } else {
                tiers.dynamic.insert(hash, DynamicEntry::fresh(entry))
            }
        };

        if let Some(victim) = evicted {
            trace!(victim, permanent, "Evicted oldest light cache entry");
        }
        self.counters.record_store(evicted.is_some());
    }

    /// Populate the dynamic tier after a miss.
    pub fn miss_and_writeback(&self, hash: u64, color: Rgb, weight: f32) {
        self.store(hash, color, weight, false);
    }

    /// Invalidate dynamic results for the box `[min, max]`.
    ///
    /// Entries carry no position, so the whole dynamic tier is dropped
    /// regardless of the box. Permanent entries are kept.
    pub fn invalidate_sector(&self, min: [f32; 3], max: [f32; 3]) {
        let dropped = self.write().dynamic.clear();
        self.counters.record_sector_invalidation();
        debug!(?min, ?max, dropped, "Sector invalidated, dynamic tier flushed");
    }

    /// Invalidate dynamic results within `radius` of `center`.
    ///
    /// Forwards the sphere's bounding box to
    /// [`invalidate_sector`](Self::invalidate_sector).
    pub fn invalidate_sphere(&self, center: [f32; 3], radius: f32) {
        let radius = radius.abs();
        let min = center.map(|c| c - radius);
        let max = center.map(|c| c + radius);
        self.invalidate_sector(min, max);
    }

    /// Drop every dynamic entry.
    pub fn clear_dynamic(&self) {
        let dropped = self.write().dynamic.clear();
        debug!(dropped, "Cleared dynamic tier");
    }

    /// Drop both tiers.
    pub fn clear_all(&self) {
        let (permanent, dynamic) = {
            let mut tiers = self.write();
            (tiers.permanent.clear(), tiers.dynamic.clear())
        };
        debug!(permanent, dynamic, "Cleared light cache");
    }

    /// Number of permanent entries.
    pub fn len_permanent(&self) -> usize {
        self.read().permanent.len()
    }

    /// Number of dynamic entries.
    pub fn len_dynamic(&self) -> usize {
        self.read().dynamic.len()
    }

    /// Current sizes plus activity counters.
    pub fn stats(&self) -> CacheStats {
        let mut stats = {
            let tiers = self.read();
            CacheStats {
                permanent_count: tiers.permanent.len(),
                permanent_capacity: tiers.permanent.capacity(),
                dynamic_count: tiers.dynamic.len(),
                dynamic_capacity: tiers.dynamic.capacity(),
                ..CacheStats::default()
            }
        };
        self.counters.fill(&mut stats);
        stats
    }

    /// Zero the activity counters.
    pub fn reset_stats(&self) {
        self.counters.reset();
    }

    /// Persist both tiers now, logging instead of failing.
    pub fn flush(&self) {
        if let Err(e) = self.save() {
            warn!(error = %e, "Failed to save light cache");
        }
    }

    /// Replace the in-memory tiers with the contents of the backing file.
    ///
    /// On error the cache is left exactly as it was.
    pub fn load(&self) -> PersistResult<LoadSummary> {
        self.file_bound.store(true, Ordering::Release);
        let snapshot = match persist::read_snapshot_file(self.path()) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let rejected = !matches!(e, PersistenceError::NotFound(_));
                self.load_rejected.store(rejected, Ordering::Release);
                return Err(e);
            }
        };
        self.load_rejected.store(false, Ordering::Release);

        let mut tiers = self.write();
        tiers.permanent.clear();
        tiers.dynamic.clear();

        let mut evicted = 0;
        for (key, entry) in snapshot.permanent {
            evicted += usize::from(tiers.permanent.insert(key, entry).is_some());
        }
        for (key, entry) in snapshot.dynamic {
            evicted += usize::from(tiers.dynamic.insert(key, entry).is_some());
        }
        if evicted > 0 {
            debug!(evicted, "Cache file exceeds configured capacity, oldest records dropped");
        }

        Ok(LoadSummary {
            permanent: tiers.permanent.len(),
            dynamic: tiers.dynamic.len(),
            evicted,
        })
    }

    /// Write both tiers to the backing file, returning the bytes written.
    ///
    /// Writers are blocked for the duration; readers are not.
    pub fn save(&self) -> PersistResult<u64> {
        let tiers = self.read();
        let bytes = persist::write_tiers(self.path(), tiers.permanent.iter(), tiers.dynamic.iter())?;
        self.file_bound.store(true, Ordering::Release);
        self.load_rejected.store(false, Ordering::Release);
        info!(
            path = %self.path().display(),
            permanent = tiers.permanent.len(),
            dynamic = tiers.dynamic.len(),
            bytes,
            "Saved light cache"
        );
        Ok(bytes)
    }

    // Every mutation leaves both tiers consistent before it can panic, so a
    // poisoned lock still guards valid data.
    fn read(&self) -> RwLockReadGuard<'_, Tiers> {
        self.tiers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tiers> {
        self.tiers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for LightCache {
    fn drop(&mut self) {
        if !self.config.persist_on_drop || !self.file_bound.load(Ordering::Acquire) {
            return;
        }
        if self.load_rejected.load(Ordering::Acquire) {
            warn!(
                path = %self.path().display(),
                "Overwriting rejected light cache file on drop"
            );
        }
        self.flush();
    }
}
