//! Shared helpers for integration tests.
//!
//! Streams are read back with [`Pages`] so assertions work on parsed
//! headers instead of raw offsets.

#![allow(dead_code)]

use std::sync::Once;

use opusmux::ogg::{Page, Pages};
use opusmux::{MuxerConfig, OpusMuxer};

static TRACING: Once = Once::new();

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Muxer for 48 kHz stereo with a fixed serial.
pub fn stereo_muxer() -> OpusMuxer {
    init_tracing();
    OpusMuxer::with_config(&MuxerConfig::new(48_000, 2).with_serial(0x0badcafe))
        .expect("valid config")
}

/// Parse every page in `stream`, panicking on malformed input.
pub fn pages(stream: &[u8]) -> Vec<Page<'_>> {
    Pages::new(stream)
        .collect::<Result<Vec<_>, _>>()
        .expect("stream should parse")
}
