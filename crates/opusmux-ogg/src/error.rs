//! Error types for opusmux-ogg.

use thiserror::Error;

/// Result type for opusmux-ogg operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for reading serialized Ogg pages back.
///
/// Writing pages cannot fail; these only come out of [`crate::PageHeader::parse`]
/// and the [`crate::Pages`] iterator.
#[derive(Debug, Error)]
pub enum Error {
    /// Input ended before the page did.
    #[error("Truncated page: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    /// The first four bytes are not `OggS`.
    #[error("Bad capture pattern: {0:02x?}")]
    BadCapture([u8; 4]),

    /// Stream structure version other than 0.
    #[error("Unsupported page version: {0}")]
    UnsupportedVersion(u8),

    /// Stored checksum does not match the page contents.
    #[error("Checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
}

impl Error {
    /// Create a truncation error.
    pub fn truncated(need: usize, have: usize) -> Self {
        Self::Truncated { need, have }
    }
}
