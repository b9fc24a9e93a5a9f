//! Cache file I/O
//!
//! Saves are atomic: the snapshot is written to `<path>.tmp`, synced, then
//! renamed over `<path>`. A crash mid-save leaves the previous file in place.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use lightlock_format::{
    read_snapshot, write_snapshot, CacheEntry, DynamicEntry, FormatError, Snapshot,
};
use thiserror::Error;

/// Persistence result type
pub type PersistResult<T> = Result<T, PersistenceError>;

/// Errors from loading or saving the cache file
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("cache file not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid cache file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

impl PersistenceError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn format(path: &Path, source: FormatError) -> Self {
        match source {
            FormatError::Io(source) => Self::io(path, source),
            source => Self::Format {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// Read and decode a whole cache file.
pub fn read_snapshot_file(path: &Path) -> PersistResult<Snapshot> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            PersistenceError::NotFound(path.to_path_buf())
        } else {
            PersistenceError::io(path, e)
        }
    })?;

    read_snapshot(BufReader::new(file)).map_err(|e| PersistenceError::format(path, e))
}

/// Atomically replace `path` with `snapshot`.
pub fn write_snapshot_file(path: &Path, snapshot: &Snapshot) -> PersistResult<u64> {
    write_tiers(
        path,
        snapshot.permanent.iter().map(|(key, entry)| (*key, entry)),
        snapshot.dynamic.iter().map(|(key, entry)| (*key, entry)),
    )
}

/// Atomically replace `path` with the given tiers, written in iteration order.
pub(crate) fn write_tiers<'a, P, D>(path: &Path, permanent: P, dynamic: D) -> PersistResult<u64>
where
    P: ExactSizeIterator<Item = (u64, &'a CacheEntry)>,
    D: ExactSizeIterator<Item = (u64, &'a DynamicEntry)>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
    }

    let temp_path = temp_path_for(path);
    let result = write_temp(&temp_path, permanent, dynamic)
        .and_then(|bytes| {
            fs::rename(&temp_path, path).map_err(|e| PersistenceError::io(path, e))?;
            Ok(bytes)
        });

    if result.is_err() {
        // Best effort; the previous file at `path` is untouched.
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_temp<'a, P, D>(temp_path: &Path, permanent: P, dynamic: D) -> PersistResult<u64>
where
    P: ExactSizeIterator<Item = (u64, &'a CacheEntry)>,
    D: ExactSizeIterator<Item = (u64, &'a DynamicEntry)>,
{
    let file = File::create(temp_path).map_err(|e| PersistenceError::io(temp_path, e))?;
    let mut writer = BufWriter::new(file);

    let bytes = write_snapshot(&mut writer, permanent, dynamic)
        .map_err(|e| PersistenceError::format(temp_path, e))?;

    writer.flush().map_err(|e| PersistenceError::io(temp_path, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| PersistenceError::io(temp_path, e.into_error()))?;
    file.sync_all().map_err(|e| PersistenceError::io(temp_path, e))?;

    Ok(bytes)
}

/// `<path>.tmp`, keeping the original extension.
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
