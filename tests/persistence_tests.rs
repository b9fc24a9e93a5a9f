//! Integration tests: cache file persistence
//!
//! - State survives a flush followed by open
//! - Rejected files (bad magic, truncation, wrong version) start the cache cold
//! - Dynamic entries keep their stored flag byte across a load/save cycle
//! - Saves never leave a temp file behind

use std::fs;
use std::path::Path;

use lightlock::cache::{read_snapshot_file, write_snapshot_file};
use lightlock::{CacheConfig, CacheEntry, DynamicEntry, LightCache, Rgb};
use lightlock_format::{Snapshot, MAGIC, VERSION};
use tempfile::TempDir;

fn config_for(path: &Path) -> CacheConfig {
    CacheConfig::with_path(path)
        .with_capacities(16, 16)
        .with_persist_on_drop(false)
}

fn header_bytes(magic: u32, version: u32) -> Vec<u8> {
    let mut bytes = magic.to_le_bytes().to_vec();
    bytes.extend_from_slice(&version.to_le_bytes());
    bytes
}

// === Round trip ===

#[test]
fn test_flush_then_open_restores_both_tiers() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lightlock.bin");

    let cache = LightCache::new(config_for(&path));
    cache.store(42, Rgb::new(0.1, 0.2, 0.3), 1.0, true);
    cache.store(7, Rgb::new(0.4, 0.5, 0.6), 0.5, false);
    cache.flush();
    drop(cache);

    let reopened = LightCache::open(config_for(&path));
    assert_eq!(reopened.len_permanent(), 1);
    assert_eq!(reopened.len_dynamic(), 1);
    assert_eq!(
        reopened.hit(42),
        Some(CacheEntry::new(Rgb::new(0.1, 0.2, 0.3), 1.0))
    );
    assert_eq!(
        reopened.hit(7),
        Some(CacheEntry::new(Rgb::new(0.4, 0.5, 0.6), 0.5))
    );
}

#[test]
fn test_invalidated_sector_stays_invalidated_after_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lightlock.bin");

    let cache = LightCache::new(config_for(&path));
    cache.store(42, Rgb::new(0.1, 0.2, 0.3), 1.0, true);
    cache.store(7, Rgb::new(0.4, 0.5, 0.6), 0.5, false);
    cache.invalidate_sector([0.0; 3], [1.0; 3]);
    cache.flush();
    drop(cache);

    let reopened = LightCache::open(config_for(&path));
    assert!(reopened.hit(42).is_some());
    assert!(reopened.hit(7).is_none());
}

#[test]
fn test_persist_on_drop_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lightlock.bin");

    {
        let cache = LightCache::open(config_for(&path).with_persist_on_drop(true));
        cache.store(1, Rgb::new(1.0, 0.0, 0.0), 0.5, true);
    }

    let reopened = LightCache::open(config_for(&path));
    assert_eq!(
        reopened.hit(1),
        Some(CacheEntry::new(Rgb::new(1.0, 0.0, 0.0), 0.5))
    );
}

#[test]
fn test_new_cache_drop_leaves_baked_file_alone() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("baked.bin");
    let snapshot = Snapshot {
        permanent: (0..100)
            .map(|key| (key, CacheEntry::new(Rgb::new(0.2, 0.4, 0.6), 1.0)))
            .collect(),
        dynamic: Vec::new(),
    };
    write_snapshot_file(&path, &snapshot).unwrap();

    {
        let _cache = LightCache::new(config_for(&path).with_persist_on_drop(true));
    }

    assert_eq!(read_snapshot_file(&path).unwrap().permanent.len(), 100);
}

#[test]
fn test_dynamic_flag_survives_load_and_save() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("baked.bin");

    let snapshot = Snapshot {
        permanent: vec![(1, CacheEntry::new(Rgb::new(0.2, 0.2, 0.2), 1.0))],
        dynamic: vec![
            (
                2,
                DynamicEntry {
                    entry: CacheEntry::new(Rgb::new(0.3, 0.3, 0.3), 0.5),
                    age: 17,
                },
            ),
            (
                3,
                DynamicEntry {
                    entry: CacheEntry::new(Rgb::new(0.4, 0.4, 0.4), 0.25),
                    age: 255,
                },
            ),
        ],
    };
    write_snapshot_file(&path, &snapshot).unwrap();
    let original = fs::read(&path).unwrap();

    let cache = LightCache::open(config_for(&path));
    cache.save().unwrap();

    assert_eq!(fs::read(&path).unwrap(), original);
}

#[test]
fn test_save_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lightlock.bin");

    let cache = LightCache::new(config_for(&path));
    cache.store(5, Rgb::default(), 1.0, true);
    cache.save().unwrap();
    cache.save().unwrap();

    let names: Vec<_> = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("lightlock.bin")]);
}

#[test]
fn test_save_file_size_matches_layout() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lightlock.bin");

    let cache = LightCache::new(config_for(&path));
    for key in 0..3 {
        cache.store(key, Rgb::default(), 1.0, true);
    }
    cache.store(10, Rgb::default(), 1.0, false);
    cache.save().unwrap();

    // header + count + 3 * 24 + count + 1 * 25
    assert_eq!(fs::metadata(&path).unwrap().len(), 8 + 8 + 72 + 8 + 25);
}

// === Cold starts ===

#[test]
fn test_missing_file_starts_cold() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.bin");

    let cache = LightCache::open(config_for(&path));
    assert_eq!(cache.len_permanent(), 0);
    assert_eq!(cache.len_dynamic(), 0);
    assert!(!path.exists(), "open must not create the file");
}

#[test]
fn test_bad_magic_starts_cold() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("foreign.bin");
    let mut bytes = header_bytes(0xDEAD_BEEF, VERSION);
    bytes.extend_from_slice(&0u64.to_le_bytes());
    bytes.extend_from_slice(&0u64.to_le_bytes());
    fs::write(&path, bytes).unwrap();

    let cache = LightCache::open(config_for(&path));
    assert_eq!(cache.len_permanent(), 0);
    assert_eq!(cache.len_dynamic(), 0);
}

#[test]
fn test_old_version_starts_cold() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("old.bin");
    let mut bytes = header_bytes(MAGIC, VERSION - 1);
    bytes.extend_from_slice(&0u64.to_le_bytes());
    bytes.extend_from_slice(&0u64.to_le_bytes());
    fs::write(&path, bytes).unwrap();

    let cache = LightCache::open(config_for(&path));
    assert_eq!(cache.len_permanent(), 0);
}

#[test]
fn test_truncated_file_starts_cold() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("truncated.bin");

    // Claims two permanent records but holds only one.
    let mut bytes = header_bytes(MAGIC, VERSION);
    bytes.extend_from_slice(&2u64.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 24]);
    fs::write(&path, bytes).unwrap();

    let cache = LightCache::open(config_for(&path));
    assert_eq!(cache.len_permanent(), 0, "no partial load");
    assert_eq!(cache.len_dynamic(), 0);
}

#[test]
fn test_header_only_file_starts_cold() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("header.bin");
    fs::write(&path, header_bytes(MAGIC, VERSION)).unwrap();

    let cache = LightCache::open(config_for(&path));
    assert_eq!(cache.len_permanent(), 0);
    assert!(read_snapshot_file(&path).is_err());
}

#[test]
fn test_rejected_file_is_replaced_by_next_save() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lightlock.bin");
    fs::write(&path, b"not a cache file").unwrap();

    let cache = LightCache::open(config_for(&path));
    cache.store(9, Rgb::new(0.5, 0.5, 0.5), 1.0, true);
    cache.save().unwrap();

    let snapshot = read_snapshot_file(&path).unwrap();
    assert_eq!(snapshot.permanent.len(), 1);
    assert_eq!(snapshot.permanent[0].0, 9);
}

#[test]
fn test_failed_save_keeps_memory() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, b"x").unwrap();

    let cache = LightCache::new(config_for(&blocker.join("lightlock.bin")));
    cache.store(1, Rgb::default(), 1.0, true);

    assert!(cache.save().is_err());
    cache.flush();
    assert!(cache.hit(1).is_some());
}
