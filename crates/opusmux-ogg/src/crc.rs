//! Ogg page checksum.
//!
//! CRC-32 with generator polynomial 0x04C11DB7, processed MSB first, zero
//! initial value, no reflection and no final xor. This is not the zlib CRC;
//! pages checked with the wrong variant are rejected by every Ogg reader.

use std::sync::LazyLock;

use crate::page::{CHECKSUM_RANGE, HEADER_LEN};

const POLYNOMIAL: u32 = 0x04c1_1db7;

/// Lookup table shared by every stream in the process.
static TABLE: LazyLock<[u32; 256]> = LazyLock::new(build_table);

fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut r = (i as u32) << 24;
        for _ in 0..8 {
            r = if r & 0x8000_0000 != 0 {
                (r << 1) ^ POLYNOMIAL
            } else {
                r << 1
            };
        }
        *entry = r;
    }
    table
}

/// Continue a running checksum over `data`.
#[inline]
pub fn update(crc: u32, data: &[u8]) -> u32 {
    let table = &*TABLE;
    data.iter().fold(crc, |crc, &byte| {
        (crc << 8) ^ table[((crc >> 24) as u8 ^ byte) as usize]
    })
}

/// Checksum of a byte slice from a zero start.
pub fn crc32(data: &[u8]) -> u32 {
    update(0, data)
}

/// Checksum of a serialized page with the checksum field read as zero.
///
/// Whatever is currently stored at offsets 22..26 is ignored, so the same
/// function both produces and verifies page checksums.
///
/// # Panics
///
/// If `page` is shorter than a page header. Only a broken serializer can
/// produce such a buffer.
pub fn page_checksum(page: &[u8]) -> u32 {
    assert!(
        page.len() >= HEADER_LEN,
        "page buffer of {} bytes is shorter than the {HEADER_LEN}-byte header",
        page.len()
    );

    let crc = update(0, &page[..CHECKSUM_RANGE.start]);
    let crc = update(crc, &[0; 4]);
    update(crc, &page[CHECKSUM_RANGE.end..])
}
