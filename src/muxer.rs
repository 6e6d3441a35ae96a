//! High-level Ogg Opus muxer API.
//!
//! Usage:
//! ```ignore
//! let mut muxer = OpusMuxer::new(48_000, 2)?;
//!
//! // Packets straight from the encoder, in decode order
//! muxer.add_packet(&packet, 960);
//!
//! // Terminal flush, then every page concatenated
//! let stream = muxer.finish();
//! ```

use std::io::Write;

use bytes::Bytes;
use opusmux_ogg::{LogicalStream, Pages};

use crate::config::{validate_config, MuxerConfig};
use crate::error::{Error, Result};
use crate::headers::{OpusHead, OpusTags};

/// Muxes pre-encoded Opus packets into an Ogg bitstream held in memory.
///
/// Both header pages are written on construction. Each call to
/// [`OpusMuxer::add_packet`] may flush a page; the stream is closed by a
/// terminal flush from [`OpusMuxer::get_stream`], [`OpusMuxer::finish`] or
/// [`OpusMuxer::write_to`].
#[derive(Debug)]
pub struct OpusMuxer {
    stream: LogicalStream,
    sample_rate: u32,
    channels: u8,
}

impl OpusMuxer {
    /// Create a muxer with default header settings and a random serial.
    pub fn new(sample_rate: u32, channels: u8) -> Result<Self> {
        Self::with_config(&MuxerConfig::new(sample_rate, channels))
    }

    /// Create a muxer from a full configuration.
    pub fn with_config(config: &MuxerConfig) -> Result<Self> {
        validate_config(config)?;

        let serial = config.serial.unwrap_or_else(rand::random);
        let mut stream = LogicalStream::new(serial);
        stream.write_standalone(&OpusHead::from_config(config).to_bytes());
        stream.write_standalone(&OpusTags::from_config(config).to_bytes());

        tracing::info!(
            serial,
            sample_rate = config.sample_rate,
            channels = config.channels,
            "Created Opus muxer"
        );

        Ok(Self {
            stream,
            sample_rate: config.sample_rate,
            channels: config.channels,
        })
    }

    /// Accept one encoded packet spanning `sample_count` samples.
    ///
    /// The bytes are copied, so the caller may reuse its buffer right away.
    pub fn add_packet(&mut self, packet: &[u8], sample_count: u64) {
        self.stream.add_packet(packet, sample_count);
    }

    /// Write pending packets as a page.
    ///
    /// With `terminal` set the page carries the end-of-stream flag and is
    /// written even if nothing is pending.
    pub fn flush(&mut self, terminal: bool) {
        self.stream.flush(terminal);
    }

    /// Close the stream and return every page not yet drained.
    ///
    /// Calling this again appends another empty end-of-stream page, so it
    /// should be called once.
    pub fn get_stream(&mut self) -> Bytes {
        self.flush(true);
        let out = self.stream.concat();
        tracing::info!(
            serial = self.stream.serial(),
            pages = self.stream.pages_emitted(),
            granule = self.stream.granule_position(),
            bytes = out.len(),
            "Finished Opus stream"
        );
        out
    }

    /// Close the stream and return it, consuming the muxer.
    pub fn finish(mut self) -> Bytes {
        self.get_stream()
    }

    /// Close the stream and write every page not yet drained to `writer`.
    ///
    /// Returns the number of bytes written.
    pub fn write_to<W: Write>(mut self, mut writer: W) -> Result<u64> {
        self.flush(true);

        let mut written = 0u64;
        for page in self.stream.drain_pages() {
            writer.write_all(&page)?;
            written += page.len() as u64;
        }
        writer.flush()?;

        tracing::info!(
            serial = self.stream.serial(),
            pages = self.stream.pages_emitted(),
            bytes = written,
            "Wrote Opus stream"
        );
        Ok(written)
    }

    /// Take the pages flushed so far, for incremental output.
    ///
    /// Drained pages are not repeated by later calls.
    pub fn drain_pages(&mut self) -> Vec<Bytes> {
        self.stream.drain_pages()
    }

    /// Stream serial number.
    pub fn serial(&self) -> u32 {
        self.stream.serial()
    }

    /// Sum of the sample counts of every packet added.
    pub fn granule_position(&self) -> u64 {
        self.stream.granule_position()
    }

    /// Pages flushed so far, header pages included.
    pub fn page_count(&self) -> u64 {
        self.stream.pages_emitted()
    }

    /// Lacing segments waiting for the next page.
    pub fn pending_segments(&self) -> usize {
        self.stream.pending().segment_count()
    }

    /// Input sample rate recorded in the identification header.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count recorded in the identification header.
    pub fn channels(&self) -> u8 {
        self.channels
    }
}

/// Read a finished stream back and check its framing.
///
/// Every page must parse, carry a valid checksum, belong to the serial of
/// the first page and follow its predecessor's sequence number. Returns the
/// number of pages.
pub fn verify_stream(stream: &[u8]) -> Result<usize> {
    let mut count = 0usize;
    let mut first: Option<(u32, u32)> = None;

    for page in Pages::new(stream) {
        let page = page?;
        page.verify_checksum()?;

        let header = page.header;
        match first {
            None => first = Some((header.serial, header.sequence)),
            Some((serial, start)) => {
                if header.serial != serial {
                    return Err(Error::InvalidStream(format!(
                        "page {count} belongs to stream {:#010x}, expected {serial:#010x}",
                        header.serial
                    )));
                }
                let expected = start.wrapping_add(count as u32);
                if header.sequence != expected {
                    return Err(Error::InvalidStream(format!(
                        "page sequence {} where {expected} was expected",
                        header.sequence
                    )));
                }
            }
        }
        count += 1;
    }

    Ok(count)
}
