//! Ogg page serialization and inspection.
//!
//! Page layout (all multi-byte fields little-endian):
//!
//! ```text
//!  0  capture pattern "OggS"
//!  4  stream structure version (0)
//!  5  header type flags
//!  6  granule position (u64)
//! 14  stream serial number (u32)
//! 18  page sequence number (u32)
//! 22  checksum (u32)
//! 26  segment count
//! 27  segment table, then payload
//! ```

use std::ops::Range;

use bytes::{BufMut, Bytes, BytesMut};

use crate::crc;
use crate::error::{Error, Result};
use crate::lacing::PendingPage;

/// Page capture pattern.
pub const CAPTURE_PATTERN: [u8; 4] = *b"OggS";

/// Fixed header size, before the segment table.
pub const HEADER_LEN: usize = 27;

/// Byte range of the checksum field.
pub const CHECKSUM_RANGE: Range<usize> = 22..26;

/// Granule position written on pages where no packet ends (-1 as i64).
pub const NO_PACKET_GRANULE: u64 = u64::MAX;

const VERSION: u8 = 0;

/// Header type flags.
pub mod flags {
    /// First segment continues a packet from the previous page.
    pub const CONTINUED: u8 = 0x01;
    /// First page of the logical bitstream.
    pub const BOS: u8 = 0x02;
    /// Last page of the logical bitstream.
    pub const EOS: u8 = 0x04;
}

/// Fixed-size part of a page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Header type flags, see [`flags`].
    pub flags: u8,
    /// Granule position of the last packet ending on the page.
    pub granule_position: u64,
    /// Logical bitstream serial number.
    pub serial: u32,
    /// Page sequence number.
    pub sequence: u32,
    /// Stored checksum.
    pub checksum: u32,
    /// Number of entries in the segment table.
    pub segment_count: u8,
}

impl PageHeader {
    /// Parse the 27-byte fixed header at the start of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(Error::truncated(HEADER_LEN, buf.len()));
        }

        let capture = read_array::<4>(buf, 0);
        if capture != CAPTURE_PATTERN {
            return Err(Error::BadCapture(capture));
        }
        if buf[4] != VERSION {
            return Err(Error::UnsupportedVersion(buf[4]));
        }

        Ok(Self {
            flags: buf[5],
            granule_position: u64::from_le_bytes(read_array(buf, 6)),
            serial: u32::from_le_bytes(read_array(buf, 14)),
            sequence: u32::from_le_bytes(read_array(buf, 18)),
            checksum: u32::from_le_bytes(read_array(buf, 22)),
            segment_count: buf[26],
        })
    }

    /// Whether this is the first page of the stream.
    pub fn is_bos(&self) -> bool {
        self.flags & flags::BOS != 0
    }

    /// Whether this is the last page of the stream.
    pub fn is_eos(&self) -> bool {
        self.flags & flags::EOS != 0
    }

    /// Whether the page opens with the tail of an earlier packet.
    pub fn is_continued(&self) -> bool {
        self.flags & flags::CONTINUED != 0
    }
}

fn read_array<const N: usize>(buf: &[u8], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[at..at + N]);
    out
}

/// Builder that serializes one page.
pub struct PageBuilder {
    serial: u32,
    sequence: u32,
    flags: u8,
    granule_position: u64,
}

impl PageBuilder {
    /// Create a builder for page `sequence` of stream `serial`.
    pub fn new(serial: u32, sequence: u32) -> Self {
        Self {
            serial,
            sequence,
            flags: 0,
            granule_position: 0,
        }
    }

    /// Set header type flags.
    pub fn flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    /// Set granule position.
    pub fn granule_position(mut self, granule: u64) -> Self {
        self.granule_position = granule;
        self
    }

    /// Serialize the page holding `pending`'s segment table and payload.
    pub fn build(self, pending: &PendingPage) -> Bytes {
        let lacing = pending.lacing();
        let body = pending.body();
        assert!(
            lacing.len() <= u8::MAX as usize,
            "segment table of {} entries does not fit a page",
            lacing.len()
        );

        let mut buf = BytesMut::with_capacity(HEADER_LEN + lacing.len() + body.len());

        buf.put_slice(&CAPTURE_PATTERN);
        buf.put_u8(VERSION);
        buf.put_u8(self.flags);
        buf.put_u64_le(self.granule_position);
        buf.put_u32_le(self.serial);
        buf.put_u32_le(self.sequence);
        buf.put_u32_le(0); // checksum placeholder
        buf.put_u8(lacing.len() as u8);
        buf.put_slice(lacing);
        buf.put_slice(body);

        let checksum = crc::page_checksum(&buf);
        buf[CHECKSUM_RANGE].copy_from_slice(&checksum.to_le_bytes());

        buf.freeze()
    }
}

/// A serialized page borrowed from a larger buffer.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    /// Parsed fixed header.
    pub header: PageHeader,
    /// Segment table.
    pub lacing: &'a [u8],
    /// Payload.
    pub body: &'a [u8],
    raw: &'a [u8],
}

impl<'a> Page<'a> {
    /// Parse the page at the start of `buf`.
    pub fn parse(buf: &'a [u8]) -> Result<Self> {
        let header = PageHeader::parse(buf)?;

        let table_end = HEADER_LEN + header.segment_count as usize;
        if buf.len() < table_end {
            return Err(Error::truncated(table_end, buf.len()));
        }
        let lacing = &buf[HEADER_LEN..table_end];

        let body_len: usize = lacing.iter().map(|&v| v as usize).sum();
        let page_end = table_end + body_len;
        if buf.len() < page_end {
            return Err(Error::truncated(page_end, buf.len()));
        }

        Ok(Self {
            header,
            lacing,
            body: &buf[table_end..page_end],
            raw: &buf[..page_end],
        })
    }

    /// Total serialized length.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Pages always carry a header, so they are never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The page exactly as serialized.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.raw
    }

    /// Recompute the checksum and compare it with the stored one.
    pub fn verify_checksum(&self) -> Result<()> {
        let computed = crc::page_checksum(self.raw);
        if computed == self.header.checksum {
            Ok(())
        } else {
            Err(Error::ChecksumMismatch {
                stored: self.header.checksum,
                computed,
            })
        }
    }

    /// Byte lengths of the packets, or packet pieces, on this page.
    ///
    /// A trailing piece whose packet continues on the next page is included;
    /// [`Page::last_packet_continues`] tells whether one is present.
    pub fn packet_lengths(&self) -> Vec<usize> {
        let mut lengths = Vec::new();
        let mut current = 0usize;
        let mut open = false;

        for &value in self.lacing {
            current += value as usize;
            open = true;
            if value < 255 {
                lengths.push(current);
                current = 0;
                open = false;
            }
        }
        if open {
            lengths.push(current);
        }
        lengths
    }

    /// Whether the last segment table entry is 255, so the packet goes on.
    pub fn last_packet_continues(&self) -> bool {
        self.lacing.last() == Some(&255)
    }
}

/// Iterator over consecutive pages in a byte stream.
///
/// Yields an error once and then stops if the stream is malformed.
pub struct Pages<'a> {
    rest: &'a [u8],
}

impl<'a> Pages<'a> {
    /// Iterate the pages in `stream`.
    pub fn new(stream: &'a [u8]) -> Self {
        Self { rest: stream }
    }
}

impl<'a> Iterator for Pages<'a> {
    type Item = Result<Page<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        match Page::parse(self.rest) {
            Ok(page) => {
                self.rest = &self.rest[page.len()..];
                Some(Ok(page))
            }
            Err(e) => {
                self.rest = &[];
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn pending_with(packets: &[&[u8]]) -> PendingPage {
        let mut pending = PendingPage::new();
        for packet in packets {
            pending.push_packet(packet);
        }
        pending
    }

    #[test]
    fn test_build_header_fields() {
        let pending = pending_with(&[&[0xab; 200]]);
        let page = PageBuilder::new(0x1234_5678, 7)
            .flags(flags::EOS)
            .granule_position(960)
            .build(&pending);

        assert_eq!(&page[0..4], b"OggS");
        assert_eq!(page[4], 0);
        assert_eq!(page[5], flags::EOS);
        assert_eq!(&page[6..14], &960u64.to_le_bytes());
        assert_eq!(&page[14..18], &0x1234_5678u32.to_le_bytes());
        assert_eq!(&page[18..22], &7u32.to_le_bytes());
        assert_eq!(page[26], 1);
        assert_eq!(page[27], 200);
        assert_eq!(page.len(), HEADER_LEN + 1 + 200);
    }

    #[test]
    fn test_build_known_checksum() {
        // Identification header page for 48 kHz stereo, serial 0x12345678.
        let mut head = Vec::new();
        head.extend_from_slice(b"OpusHead");
        head.extend_from_slice(&[1, 2, 0, 0]);
        head.extend_from_slice(&48_000u32.to_le_bytes());
        head.extend_from_slice(&[0, 0, 0]);

        let page = PageBuilder::new(0x1234_5678, 0)
            .flags(flags::BOS)
            .build(&pending_with(&[&head]));

        assert_eq!(&page[22..26], &0xc39c_1fbbu32.to_le_bytes());
    }

    #[test]
    fn test_build_empty_eos_checksum() {
        let page = PageBuilder::new(0, 2)
            .flags(flags::EOS)
            .build(&pending_with(&[&[]]));

        assert_eq!(page.len(), 28);
        assert_eq!(&page[22..26], &0x76ff_b171u32.to_le_bytes());
    }

    #[test]
    fn test_parse_round_trip() {
        let pending = pending_with(&[&[1; 300], &[2; 5]]);
        let bytes = PageBuilder::new(99, 3)
            .flags(flags::CONTINUED)
            .granule_position(1920)
            .build(&pending);

        let page = Page::parse(&bytes).unwrap();
        assert_eq!(page.header.serial, 99);
        assert_eq!(page.header.sequence, 3);
        assert_eq!(page.header.granule_position, 1920);
        assert!(page.header.is_continued());
        assert!(!page.header.is_bos());
        assert!(!page.header.is_eos());
        assert_eq!(page.lacing, &[255, 45, 5]);
        assert_eq!(page.packet_lengths(), vec![300, 5]);
        assert!(!page.last_packet_continues());
        assert_eq!(page.len(), bytes.len());
        assert!(!page.is_empty());
        page.verify_checksum().unwrap();
    }

    #[test]
    fn test_verify_detects_corruption() {
        let bytes = PageBuilder::new(1, 0).build(&pending_with(&[b"payload"]));
        let mut corrupted = bytes.to_vec();
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0xff;

        let page = Page::parse(&corrupted).unwrap();
        assert_matches!(page.verify_checksum(), Err(Error::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_parse_errors() {
        assert_matches!(
            PageHeader::parse(&[0u8; 10]),
            Err(Error::Truncated { need: 27, have: 10 })
        );

        let mut bad = vec![0u8; HEADER_LEN];
        bad[..4].copy_from_slice(b"RIFF");
        assert_matches!(PageHeader::parse(&bad), Err(Error::BadCapture(_)));

        bad[..4].copy_from_slice(b"OggS");
        bad[4] = 1;
        assert_matches!(PageHeader::parse(&bad), Err(Error::UnsupportedVersion(1)));

        let bytes = PageBuilder::new(1, 0).build(&pending_with(&[&[0; 40]]));
        assert_matches!(
            Page::parse(&bytes[..bytes.len() - 1]),
            Err(Error::Truncated { .. })
        );
    }

    #[test]
    fn test_pages_iterator() {
        let mut stream = Vec::new();
        for seq in 0..3 {
            let page = PageBuilder::new(5, seq).build(&pending_with(&[&[seq as u8; 10]]));
            stream.extend_from_slice(&page);
        }

        let pages: Vec<_> = Pages::new(&stream).collect::<Result<_>>().unwrap();
        assert_eq!(pages.len(), 3);
        for (i, page) in pages.iter().enumerate() {
            assert_eq!(page.header.sequence, i as u32);
            assert_eq!(page.body, &[i as u8; 10]);
        }
    }

    #[test]
    fn test_pages_iterator_stops_on_error() {
        let page = PageBuilder::new(5, 0).build(&pending_with(&[b"ok"]));
        let mut stream = page.to_vec();
        stream.extend_from_slice(b"garbage that is long enough to look like a header");

        let mut pages = Pages::new(&stream);
        assert!(pages.next().unwrap().is_ok());
        assert_matches!(pages.next(), Some(Err(Error::BadCapture(_))));
        assert!(pages.next().is_none());
    }

    #[test]
    fn test_packet_lengths_open_tail() {
        let pending = {
            let packet = vec![0u8; 255 * 255];
            let frags = crate::lacing::fragments(&packet);
            let mut p = PendingPage::new();
            p.push_fragment(&frags[0]);
            p
        };
        let bytes = PageBuilder::new(1, 0).build(&pending);
        let page = Page::parse(&bytes).unwrap();

        assert!(page.last_packet_continues());
        assert_eq!(page.packet_lengths(), vec![255 * 255]);
    }
}
