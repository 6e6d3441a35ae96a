//! Error types for opusmux.

use std::io;
use thiserror::Error;

/// Result type for opusmux operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for opusmux operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Stream parameters violate the muxer's contract.
    #[error("Invalid muxer config: {0}")]
    InvalidConfig(String),

    /// Valid parameters this muxer does not implement.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// A stream read back does not hold together as one logical bitstream.
    #[error("Invalid stream: {0}")]
    InvalidStream(String),

    /// Malformed Ogg data while reading pages back.
    #[error("Ogg error: {0}")]
    Ogg(#[from] opusmux_ogg::Error),

    /// I/O error while writing the finished stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create an invalid config error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}
