//! Opusmux - Ogg Opus muxing for pre-encoded packets
//!
//! Takes Opus packets from an external encoder, each with the number of
//! samples it decodes to, and produces a standalone Ogg Opus byte stream.
//! Packet contents are never inspected.
//!
//! # Modules
//!
//! - `config` - Muxer settings, TOML loading and validation
//! - `headers` - `OpusHead` and `OpusTags` header packets
//! - `muxer` - The [`OpusMuxer`] API
//!
//! Page framing lives in the `opusmux-ogg` crate, re-exported as [`ogg`].

pub mod config;
pub mod error;
pub mod headers;
pub mod muxer;

pub use opusmux_ogg as ogg;

pub use config::{Comment, MuxerConfig};
pub use error::{Error, Result};
pub use muxer::{verify_stream, OpusMuxer};
