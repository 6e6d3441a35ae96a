//! Opusmux-Ogg: Ogg page framing for a single logical bitstream
//!
//! This crate turns a sequence of opaque packets into serialized Ogg pages.
//! It knows nothing about the codec inside; granule positions are whatever
//! sample counts the caller reports.
//!
//! # Modules
//!
//! - `crc` - Page checksum (CRC-32, polynomial 0x04C11DB7, table driven)
//! - `lacing` - Segment tables and the pending-page state machine
//! - `page` - Page serialization and read-back for inspection
//! - `stream` - Sequence/granule bookkeeping for one logical stream
//!
//! # Architecture
//!
//! Packets are accumulated into a [`PendingPage`] until the next packet would
//! push the segment table past 255 entries. At that point the pending page is
//! serialized by [`PageBuilder`], which writes the 27-byte header, segment
//! table and payload into one buffer and patches in the checksum last.
//! Finished pages are immutable [`bytes::Bytes`].

pub mod crc;
pub mod error;
pub mod lacing;
pub mod page;
pub mod stream;

pub use error::{Error, Result};
pub use lacing::{Admission, PendingPage};
pub use page::{Page, PageBuilder, PageHeader, Pages};
pub use stream::LogicalStream;
