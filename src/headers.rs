//! Opus header packets.
//!
//! Every Ogg Opus stream opens with an identification header (`OpusHead`)
//! on the first page and a comment header (`OpusTags`) on the second. Both
//! are plain little-endian layouts built with [`BufMut`].

use bytes::{BufMut, Bytes, BytesMut};

use crate::config::{Comment, MuxerConfig};

/// Magic signature of the identification header.
pub const OPUS_HEAD_MAGIC: [u8; 8] = *b"OpusHead";

/// Magic signature of the comment header.
pub const OPUS_TAGS_MAGIC: [u8; 8] = *b"OpusTags";

/// Serialized size of an identification header with mapping family 0.
pub const OPUS_HEAD_LEN: usize = 19;

const OPUS_VERSION: u8 = 1;

/// Channel mapping family 0: mono or stereo, no mapping table.
const MAPPING_FAMILY_MONO_STEREO: u8 = 0;

/// Identification header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpusHead {
    /// Output channel count.
    pub channels: u8,
    /// Samples to drop from the start of the decoded output.
    pub pre_skip: u16,
    /// Sample rate of the original input, informational only.
    pub input_sample_rate: u32,
    /// Output gain in Q7.8 dB.
    pub output_gain: i16,
}

impl OpusHead {
    /// Identification header for the stream described by `config`.
    pub fn from_config(config: &MuxerConfig) -> Self {
        Self {
            channels: config.channels,
            pre_skip: config.pre_skip,
            input_sample_rate: config.sample_rate,
            output_gain: config.output_gain,
        }
    }

    /// Serialize to the 19-byte packet.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(OPUS_HEAD_LEN);
        buf.put_slice(&OPUS_HEAD_MAGIC);
        buf.put_u8(OPUS_VERSION);
        buf.put_u8(self.channels);
        buf.put_u16_le(self.pre_skip);
        buf.put_u32_le(self.input_sample_rate);
        buf.put_i16_le(self.output_gain);
        buf.put_u8(MAPPING_FAMILY_MONO_STEREO);
        debug_assert_eq!(buf.len(), OPUS_HEAD_LEN);
        buf.freeze()
    }
}

/// Comment header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpusTags {
    /// Encoder or muxer identification string.
    pub vendor: String,
    /// User comments, written as `KEY=value`.
    pub comments: Vec<Comment>,
}

impl OpusTags {
    /// Comment header carrying `config`'s vendor string and comments.
    pub fn from_config(config: &MuxerConfig) -> Self {
        Self {
            vendor: config.vendor.clone(),
            comments: config.comments.clone(),
        }
    }

    /// Serialize to the packet: magic, vendor string, then each comment as
    /// a length-prefixed `KEY=value` string.
    pub fn to_bytes(&self) -> Bytes {
        let comments_len: usize = self
            .comments
            .iter()
            .map(|c| 4 + c.key.len() + 1 + c.value.len())
            .sum();
        let mut buf = BytesMut::with_capacity(8 + 4 + self.vendor.len() + 4 + comments_len);

        buf.put_slice(&OPUS_TAGS_MAGIC);
        buf.put_u32_le(self.vendor.len() as u32);
        buf.put_slice(self.vendor.as_bytes());
        buf.put_u32_le(self.comments.len() as u32);
        for comment in &self.comments {
            buf.put_u32_le((comment.key.len() + 1 + comment.value.len()) as u32);
            buf.put_slice(comment.key.as_bytes());
            buf.put_u8(b'=');
            buf.put_slice(comment.value.as_bytes());
        }

        buf.freeze()
    }
}
