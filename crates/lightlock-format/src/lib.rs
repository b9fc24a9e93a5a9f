//! LightLock cache file format
//!
//! Defines the cached value types and the versioned binary layout shared by
//! the runtime cache and any offline baker that pre-populates it.
//!
//! All multi-byte fields are little-endian.

pub mod codec;
pub mod entry;
pub mod error;

pub use codec::{encoded_len, read_header, read_snapshot, write_snapshot, Header, Snapshot};
pub use entry::{CacheEntry, DynamicEntry, Rgb};
pub use error::{FormatError, FormatResult, Section};

/// File magic, `"LLCK"` when read as a big-endian word.
pub const MAGIC: u32 = 0x4C4C_434B;

/// Current format version.
pub const VERSION: u32 = 3;

/// Default cache file name.
pub const DEFAULT_FILE_NAME: &str = "lightlock.bin";

/// Header size in bytes (magic + version).
pub const HEADER_LEN: u64 = 8;

/// Size of one permanent-tier record: key + 3 color channels + weight.
pub const PERMANENT_RECORD_LEN: u64 = 24;

/// Size of one dynamic-tier record: permanent record + flag byte.
pub const DYNAMIC_RECORD_LEN: u64 = 25;
