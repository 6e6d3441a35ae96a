//! Single logical bitstream writer.

use bytes::{Bytes, BytesMut};

use crate::lacing::{self, Admission, PendingPage};
use crate::page::{flags, PageBuilder, NO_PACKET_GRANULE};

/// Writes packets of one logical bitstream into serialized pages.
///
/// Owns every counter of the stream: the next page sequence number, the
/// running granule position and the pending page. Pages are kept in the
/// order they were flushed until taken with [`LogicalStream::drain_pages`]
/// or concatenated with [`LogicalStream::concat`].
#[derive(Debug)]
pub struct LogicalStream {
    serial: u32,
    sequence: u32,
    granule: u64,
    pending: PendingPage,
    pages: Vec<Bytes>,
    pages_emitted: u64,
    bytes_emitted: u64,
}

impl LogicalStream {
    /// Create an empty stream with the given serial number.
    pub fn new(serial: u32) -> Self {
        Self {
            serial,
            sequence: 0,
            granule: 0,
            pending: PendingPage::new(),
            pages: Vec::new(),
            pages_emitted: 0,
            bytes_emitted: 0,
        }
    }

    /// Stream serial number written into every page.
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Sequence number the next page will carry.
    pub fn next_sequence(&self) -> u32 {
        self.sequence
    }

    /// Cumulative sample count of every packet accepted so far.
    pub fn granule_position(&self) -> u64 {
        self.granule
    }

    /// Packets accepted but not yet written to a page.
    pub fn pending(&self) -> &PendingPage {
        &self.pending
    }

    /// Pages flushed and not yet drained.
    pub fn pages(&self) -> &[Bytes] {
        &self.pages
    }

    /// Total number of pages flushed, drained or not.
    pub fn pages_emitted(&self) -> u64 {
        self.pages_emitted
    }

    /// Total serialized bytes flushed, drained or not.
    pub fn bytes_emitted(&self) -> u64 {
        self.bytes_emitted
    }

    /// Write `packet` on a page of its own.
    ///
    /// Anything pending is flushed first, and the packet's page is flushed
    /// right away. Used for codec header packets, which contribute no
    /// samples and must not share a page with audio.
    pub fn write_standalone(&mut self, packet: &[u8]) {
        self.flush(false);
        self.add_packet(packet, 0);
        self.flush(false);
    }

    /// Accept a packet covering `samples` samples.
    ///
    /// Flushes the pending page first when the packet would push its segment
    /// table past 255 entries. A packet too large for any single page is
    /// split over continuation pages.
    pub fn add_packet(&mut self, packet: &[u8], samples: u64) {
        let segments = lacing::segment_count(packet.len());

        match self.pending.admit(segments) {
            Admission::Fits => self.pending.push_packet(packet),
            Admission::FlushFirst => {
                self.flush(false);
                self.pending.push_packet(packet);
            }
            Admission::Spans => self.push_spanning(packet),
        }

        self.granule = self.granule.saturating_add(samples);
        tracing::trace!(
            bytes = packet.len(),
            segments,
            samples,
            granule = self.granule,
            pending_segments = self.pending.segment_count(),
            "Accepted packet"
        );
    }

    fn push_spanning(&mut self, packet: &[u8]) {
        let fragments = lacing::fragments(packet);
        tracing::warn!(
            bytes = packet.len(),
            pages = fragments.len(),
            "Packet exceeds one page, splitting over continuation pages"
        );

        // Every fragment but the last fills a page, so each one after the
        // first lands on an empty pending page.
        for fragment in &fragments {
            if !self.pending.is_empty() {
                self.flush(false);
            }
            self.pending.push_fragment(fragment);
        }
    }

    /// Write the pending packets as a page.
    ///
    /// A non-terminal flush with nothing pending does nothing. A terminal
    /// flush always writes a page with the end-of-stream flag; if nothing is
    /// pending, the page carries one zero-length packet.
    pub fn flush(&mut self, terminal: bool) {
        if self.pending.is_empty() {
            if !terminal {
                return;
            }
            self.pending.push_packet(&[]);
        }

        let page = self.pending.take();

        let mut header_flags = 0;
        if self.pages_emitted == 0 {
            header_flags |= flags::BOS;
        }
        if terminal {
            header_flags |= flags::EOS;
        }
        if page.is_continued() {
            header_flags |= flags::CONTINUED;
        }

        let granule = if page.completed_packets() == 0 {
            NO_PACKET_GRANULE
        } else {
            self.granule
        };

        let bytes = PageBuilder::new(self.serial, self.sequence)
            .flags(header_flags)
            .granule_position(granule)
            .build(&page);

        tracing::debug!(
            serial = self.serial,
            sequence = self.sequence,
            granule,
            segments = page.segment_count(),
            bytes = bytes.len(),
            flags = header_flags,
            "Flushed page"
        );

        self.sequence = self.sequence.wrapping_add(1);
        self.pages_emitted += 1;
        self.bytes_emitted += bytes.len() as u64;
        self.pages.push(bytes);
    }

    /// Take the pages flushed so far.
    pub fn drain_pages(&mut self) -> Vec<Bytes> {
        std::mem::take(&mut self.pages)
    }

    /// Concatenate the pages flushed and not yet drained.
    pub fn concat(&self) -> Bytes {
        let len = self.pages.iter().map(Bytes::len).sum();
        let mut out = BytesMut::with_capacity(len);
        for page in &self.pages {
            out.extend_from_slice(page);
        }
        out.freeze()
    }
}
