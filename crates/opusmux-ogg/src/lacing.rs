//! Packet lacing and page accumulation.
//!
//! A packet of `L` bytes is described in a page's segment table by `L / 255`
//! entries of 255 followed by one entry of `L % 255`. The trailing entry is
//! always present, so a zero-length packet is a single `0` and a 510-byte
//! packet is `[255, 255, 0]`. A page holds at most 255 entries.

use bytes::BytesMut;

/// Maximum number of lacing values in one page.
pub const MAX_SEGMENTS: usize = 255;

/// Lacing value that marks "packet continues in the next segment".
pub const CONTINUATION_VALUE: u8 = 255;

/// Number of segments a packet of `len` bytes occupies.
#[inline]
pub fn segment_count(len: usize) -> usize {
    len / CONTINUATION_VALUE as usize + 1
}

/// Lacing values for a packet of `len` bytes.
pub fn lacing_values(len: usize) -> impl Iterator<Item = u8> {
    let full = len / CONTINUATION_VALUE as usize;
    let tail = (len % CONTINUATION_VALUE as usize) as u8;
    std::iter::repeat(CONTINUATION_VALUE)
        .take(full)
        .chain(std::iter::once(tail))
}

/// Outcome of offering a packet to a [`PendingPage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The packet fits alongside what is already pending.
    Fits,
    /// The pending page must be flushed before the packet can join.
    FlushFirst,
    /// The packet alone needs more than [`MAX_SEGMENTS`] segments and has to
    /// be split over several pages.
    Spans,
}

/// Part of a packet that fits in a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment<'a> {
    /// Lacing values for this part, at most [`MAX_SEGMENTS`].
    pub lacing: Vec<u8>,
    /// Payload bytes the lacing values cover.
    pub data: &'a [u8],
    /// Whether this part continues a packet started on an earlier page.
    pub continued: bool,
}

impl Fragment<'_> {
    /// Whether the packet ends within this fragment.
    pub fn completes(&self) -> bool {
        self.lacing
            .last()
            .is_some_and(|&value| value < CONTINUATION_VALUE)
    }
}

/// Split a packet into page-sized fragments.
///
/// Every fragment except the last carries exactly [`MAX_SEGMENTS`] lacing
/// values of 255. A packet that fits in one page yields a single fragment.
pub fn fragments(packet: &[u8]) -> Vec<Fragment<'_>> {
    let lacing: Vec<u8> = lacing_values(packet.len()).collect();
    let mut offset = 0;

    lacing
        .chunks(MAX_SEGMENTS)
        .enumerate()
        .map(|(i, run)| {
            let len: usize = run.iter().map(|&v| v as usize).sum();
            let data = &packet[offset..offset + len];
            offset += len;
            Fragment {
                lacing: run.to_vec(),
                data,
                continued: i > 0,
            }
        })
        .collect()
}

/// Packets waiting to be written as the next page.
///
/// Holds the segment table and payload rather than the packets themselves,
/// so a flush only has to copy two contiguous buffers.
#[derive(Debug, Default, Clone)]
pub struct PendingPage {
    lacing: Vec<u8>,
    body: BytesMut,
    continued: bool,
    completed: usize,
}

impl PendingPage {
    /// Create an empty pending page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a packet needing `segments` lacing values can join.
    pub fn admit(&self, segments: usize) -> Admission {
        if segments > MAX_SEGMENTS {
            Admission::Spans
        } else if self.lacing.len() + segments > MAX_SEGMENTS {
            Admission::FlushFirst
        } else {
            Admission::Fits
        }
    }

    /// Append a whole packet.
    ///
    /// The caller must have received [`Admission::Fits`] for it.
    pub fn push_packet(&mut self, packet: &[u8]) {
        debug_assert_eq!(
            self.admit(segment_count(packet.len())),
            Admission::Fits,
            "packet pushed without room"
        );
        self.lacing.extend(lacing_values(packet.len()));
        self.body.extend_from_slice(packet);
        self.completed += 1;
    }

    /// Append one fragment of a split packet.
    ///
    /// A continued fragment must start an empty page, since the segment
    /// table has no way to mark a continuation anywhere but its first entry.
    pub fn push_fragment(&mut self, fragment: &Fragment<'_>) {
        debug_assert!(
            !fragment.continued || self.is_empty(),
            "continued fragment must open a page"
        );
        debug_assert!(self.lacing.len() + fragment.lacing.len() <= MAX_SEGMENTS);

        if self.is_empty() {
            self.continued = fragment.continued;
        }
        self.lacing.extend_from_slice(&fragment.lacing);
        self.body.extend_from_slice(fragment.data);
        if fragment.completes() {
            self.completed += 1;
        }
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.lacing.is_empty()
    }

    /// Number of lacing values pending.
    pub fn segment_count(&self) -> usize {
        self.lacing.len()
    }

    /// Number of payload bytes pending.
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Number of packets that end on this page.
    pub fn completed_packets(&self) -> usize {
        self.completed
    }

    /// Whether the first segment continues a packet from the previous page.
    pub fn is_continued(&self) -> bool {
        self.continued
    }

    /// The pending segment table.
    pub fn lacing(&self) -> &[u8] {
        &self.lacing
    }

    /// The pending payload.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Move the pending contents out, leaving this page empty.
    pub fn take(&mut self) -> PendingPage {
        std::mem::take(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_count() {
        assert_eq!(segment_count(0), 1);
        assert_eq!(segment_count(1), 1);
        assert_eq!(segment_count(254), 1);
        assert_eq!(segment_count(255), 2);
        assert_eq!(segment_count(510), 3);
        assert_eq!(segment_count(65_024), 255);
        assert_eq!(segment_count(65_025), 256);
    }

    #[test]
    fn test_lacing_values() {
        assert_eq!(lacing_values(0).collect::<Vec<_>>(), vec![0]);
        assert_eq!(lacing_values(200).collect::<Vec<_>>(), vec![200]);
        assert_eq!(lacing_values(255).collect::<Vec<_>>(), vec![255, 0]);
        assert_eq!(lacing_values(510).collect::<Vec<_>>(), vec![255, 255, 0]);
        assert_eq!(lacing_values(600).collect::<Vec<_>>(), vec![255, 255, 90]);
    }

    #[test]
    fn test_admission_transitions() {
        let mut page = PendingPage::new();
        assert_eq!(page.admit(1), Admission::Fits);
        assert_eq!(page.admit(255), Admission::Fits);
        assert_eq!(page.admit(256), Admission::Spans);

        for _ in 0..255 {
            page.push_packet(&[0x42]);
        }
        assert_eq!(page.segment_count(), 255);
        assert_eq!(page.admit(1), Admission::FlushFirst);

        let flushed = page.take();
        assert_eq!(flushed.segment_count(), 255);
        assert_eq!(flushed.completed_packets(), 255);
        assert!(page.is_empty());
        assert_eq!(page.admit(1), Admission::Fits);
    }

    #[test]
    fn test_push_packet_accumulates() {
        let mut page = PendingPage::new();
        page.push_packet(&[1; 300]);
        page.push_packet(&[]);
        page.push_packet(&[2; 10]);

        assert_eq!(page.lacing(), &[255, 45, 0, 10]);
        assert_eq!(page.body_len(), 310);
        assert_eq!(&page.body()[..300], &[1; 300][..]);
        assert_eq!(&page.body()[300..], &[2; 10][..]);
        assert_eq!(page.completed_packets(), 3);
        assert!(!page.is_continued());
    }

    #[test]
    fn test_fragments_small_packet() {
        let packet = [7u8; 100];
        let frags = fragments(&packet);
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].lacing, vec![100]);
        assert!(frags[0].completes());
        assert!(!frags[0].continued);
    }

    #[test]
    fn test_fragments_exact_page_boundary() {
        // 255 * 255 bytes needs 255 full segments plus a terminating 0.
        let packet = vec![9u8; 255 * 255];
        let frags = fragments(&packet);

        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0].lacing.len(), MAX_SEGMENTS);
        assert_eq!(frags[0].data.len(), 255 * 255);
        assert!(!frags[0].completes());
        assert_eq!(frags[1].lacing, vec![0]);
        assert!(frags[1].data.is_empty());
        assert!(frags[1].continued);
        assert!(frags[1].completes());
    }

    #[test]
    fn test_fragments_cover_whole_packet() {
        let packet: Vec<u8> = (0..200_000u32).map(|i| i as u8).collect();
        let frags = fragments(&packet);

        assert!(frags.iter().all(|f| f.lacing.len() <= MAX_SEGMENTS));
        assert!(frags[..frags.len() - 1].iter().all(|f| !f.completes()));
        assert!(frags.last().is_some_and(|f| f.completes()));

        let joined: Vec<u8> = frags.iter().flat_map(|f| f.data.iter().copied()).collect();
        assert_eq!(joined, packet);
    }

    #[test]
    fn test_push_fragment_marks_continuation() {
        let packet = vec![1u8; 70_000];
        let frags = fragments(&packet);

        let mut first = PendingPage::new();
        first.push_fragment(&frags[0]);
        assert!(!first.is_continued());
        assert_eq!(first.completed_packets(), 0);
        assert_eq!(first.admit(1), Admission::FlushFirst);

        let mut second = PendingPage::new();
        second.push_fragment(&frags[1]);
        assert!(second.is_continued());
        assert_eq!(second.completed_packets(), 1);
    }
}
