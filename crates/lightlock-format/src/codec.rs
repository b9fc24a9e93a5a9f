//! Binary codec for cache files.
//!
//! Layout (little-endian):
//! - `magic: u32`, `version: u32`
//! - `count: u64`, then `count` permanent records `{ key: u64, r, g, b, weight: f32 }`
//! - `count: u64`, then `count` dynamic records `{ key: u64, r, g, b, weight: f32, flag: u8 }`
//!
//! Nothing may follow the dynamic section.

use std::io::{Read, Write};

use crate::entry::{CacheEntry, DynamicEntry, Rgb};
use crate::error::{FormatError, FormatResult, Section};
use crate::{DYNAMIC_RECORD_LEN, HEADER_LEN, MAGIC, PERMANENT_RECORD_LEN, VERSION};

/// Upper bound on records preallocated from an untrusted count.
const PREALLOC_LIMIT: u64 = 1 << 16;

/// Decoded file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub version: u32,
}

impl Header {
    /// Header written by this version of the codec.
    pub const CURRENT: Header = Header {
        magic: MAGIC,
        version: VERSION,
    };

    /// Reject foreign files and other format versions.
    pub fn validate(&self) -> FormatResult<()> {
        if self.magic != MAGIC {
            return Err(FormatError::BadMagic { found: self.magic });
        }
        if self.version != VERSION {
            return Err(FormatError::UnsupportedVersion {
                found: self.version,
            });
        }
        Ok(())
    }
}

/// Both tiers of a cache file, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub permanent: Vec<(u64, CacheEntry)>,
    pub dynamic: Vec<(u64, DynamicEntry)>,
}

impl Snapshot {
    /// Exact encoded size in bytes.
    pub fn encoded_len(&self) -> u64 {
        encoded_len(self.permanent.len(), self.dynamic.len())
    }

    /// Encode this snapshot to `writer`.
    pub fn write_to<W: Write>(&self, writer: W) -> FormatResult<u64> {
        write_snapshot(
            writer,
            self.permanent.iter().map(|(key, entry)| (*key, entry)),
            self.dynamic.iter().map(|(key, entry)| (*key, entry)),
        )
    }
}

/// Exact encoded size of a file with the given tier sizes.
pub fn encoded_len(permanent: usize, dynamic: usize) -> u64 {
    HEADER_LEN
        + 8
        + permanent as u64 * PERMANENT_RECORD_LEN
        + 8
        + dynamic as u64 * DYNAMIC_RECORD_LEN
}

/// Encode both tiers to `writer`, returning the number of bytes written.
///
/// Entries are written in iteration order. The writer is not flushed.
pub fn write_snapshot<'a, W, P, D>(mut writer: W, permanent: P, dynamic: D) -> FormatResult<u64>
where
    W: Write,
    P: ExactSizeIterator<Item = (u64, &'a CacheEntry)>,
    D: ExactSizeIterator<Item = (u64, &'a DynamicEntry)>,
{
    let (permanent_len, dynamic_len) = (permanent.len(), dynamic.len());

    writer.write_all(&MAGIC.to_le_bytes())?;
    writer.write_all(&VERSION.to_le_bytes())?;

    writer.write_all(&(permanent_len as u64).to_le_bytes())?;
    for (key, entry) in permanent {
        writer.write_all(&encode_permanent(key, entry))?;
    }

    writer.write_all(&(dynamic_len as u64).to_le_bytes())?;
    for (key, entry) in dynamic {
        writer.write_all(&encode_dynamic(key, entry))?;
    }

    Ok(encoded_len(permanent_len, dynamic_len))
}

/// Read and validate only the header.
pub fn read_header<R: Read>(mut reader: R) -> FormatResult<Header> {
    let bytes: [u8; HEADER_LEN as usize] = read_array(&mut reader, Section::Header)?;
    let header = Header {
        magic: le_u32(&bytes, 0),
        version: le_u32(&bytes, 4),
    };
    header.validate()?;
    Ok(header)
}

/// Decode a complete file.
///
/// Either the whole file is accepted or an error is returned; callers never
/// see a partially decoded snapshot.
pub fn read_snapshot<R: Read>(mut reader: R) -> FormatResult<Snapshot> {
    read_header(&mut reader)?;

    let count = read_count(&mut reader, Section::Permanent)?;
    let mut permanent = Vec::with_capacity(count.min(PREALLOC_LIMIT) as usize);
    for _ in 0..count {
        let record: [u8; PERMANENT_RECORD_LEN as usize] =
            read_array(&mut reader, Section::Permanent)?;
        permanent.push((le_u64(&record, 0), decode_entry(&record[8..24])));
    }

    let count = read_count(&mut reader, Section::Dynamic)?;
    let mut dynamic = Vec::with_capacity(count.min(PREALLOC_LIMIT) as usize);
    for _ in 0..count {
        let record: [u8; DYNAMIC_RECORD_LEN as usize] = read_array(&mut reader, Section::Dynamic)?;
        let entry = DynamicEntry {
            entry: decode_entry(&record[8..24]),
            age: record[24],
        };
        dynamic.push((le_u64(&record, 0), entry));
    }

    let mut probe = [0u8; 1];
    if reader.read(&mut probe)? != 0 {
        return Err(FormatError::TrailingBytes);
    }

    Ok(Snapshot { permanent, dynamic })
}

fn encode_permanent(key: u64, entry: &CacheEntry) -> [u8; PERMANENT_RECORD_LEN as usize] {
    let mut out = [0u8; PERMANENT_RECORD_LEN as usize];
    out[0..8].copy_from_slice(&key.to_le_bytes());
    out[8..12].copy_from_slice(&entry.color.r.to_le_bytes());
    out[12..16].copy_from_slice(&entry.color.g.to_le_bytes());
    out[16..20].copy_from_slice(&entry.color.b.to_le_bytes());
    out[20..24].copy_from_slice(&entry.weight.to_le_bytes());
    out
}

fn encode_dynamic(key: u64, entry: &DynamicEntry) -> [u8; DYNAMIC_RECORD_LEN as usize] {
    let mut out = [0u8; DYNAMIC_RECORD_LEN as usize];
    out[..24].copy_from_slice(&encode_permanent(key, &entry.entry));
    out[24] = entry.age;
    out
}

/// Decode `{ r, g, b, weight }` from a 16-byte slice.
fn decode_entry(bytes: &[u8]) -> CacheEntry {
    CacheEntry {
        color: Rgb::new(le_f32(bytes, 0), le_f32(bytes, 4), le_f32(bytes, 8)),
        weight: le_f32(bytes, 12),
    }
}

fn read_count<R: Read>(reader: &mut R, section: Section) -> FormatResult<u64> {
    let bytes: [u8; 8] = read_array(reader, section)?;
    Ok(u64::from_le_bytes(bytes))
}

fn read_array<const N: usize, R: Read>(reader: &mut R, section: Section) -> FormatResult<[u8; N]> {
    let mut buf = [0u8; N];
    reader
        .read_exact(&mut buf)
        .map_err(|e| FormatError::from_read(e, section))?;
    Ok(buf)
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(word)
}

fn le_u64(bytes: &[u8], at: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(word)
}

fn le_f32(bytes: &[u8], at: usize) -> f32 {
    f32::from_bits(le_u32(bytes, at))
}
