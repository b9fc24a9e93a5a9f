//! Errors raised while encoding or decoding cache files.

use std::fmt;
use std::io;

use thiserror::Error;

/// Format result type
pub type FormatResult<T> = Result<T, FormatError>;

/// Region of the file being processed when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Permanent,
    Dynamic,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => write!(f, "header"),
            Self::Permanent => write!(f, "permanent tier"),
            Self::Dynamic => write!(f, "dynamic tier"),
        }
    }
}

/// Errors from the cache file codec
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("bad magic 0x{found:08X} (expected 0x{:08X})", crate::MAGIC)]
    BadMagic { found: u32 },

    #[error("unsupported format version {found} (expected {})", crate::VERSION)]
    UnsupportedVersion { found: u32 },

    #[error("file truncated in {section}")]
    Truncated { section: Section },

    #[error("unexpected data after dynamic tier")]
    TrailingBytes,
}

impl FormatError {
    /// Map an I/O error from a read in `section`, turning short reads into
    /// `Truncated`.
    pub(crate) fn from_read(err: io::Error, section: Section) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated { section }
        } else {
            Self::Io(err)
        }
    }
}
