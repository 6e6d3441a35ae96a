use serde::{Deserialize, Serialize};

/// Settings for one Ogg Opus stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MuxerConfig {
    /// Input sample rate in Hz, recorded in the identification header.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Channel count; mapping family 0 allows 1 or 2.
    #[serde(default = "default_channels")]
    pub channels: u8,

    /// Samples to discard from the start of the decoded output.
    #[serde(default)]
    pub pre_skip: u16,

    /// Output gain in Q7.8 dB.
    #[serde(default)]
    pub output_gain: i16,

    /// Vendor string written into the comment header.
    #[serde(default = "default_vendor")]
    pub vendor: String,

    /// Fixed stream serial number; random when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<u32>,

    /// User comments written into the comment header.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// One `KEY=value` user comment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Comment {
    pub key: String,
    pub value: String,
}

impl Comment {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

fn default_sample_rate() -> u32 {
    48_000
}

fn default_channels() -> u8 {
    2
}

fn default_vendor() -> String {
    concat!("opusmux ", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for MuxerConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            pre_skip: 0,
            output_gain: 0,
            vendor: default_vendor(),
            serial: None,
            comments: Vec::new(),
        }
    }
}

impl MuxerConfig {
    /// Config with the given audio parameters and defaults elsewhere.
    pub fn new(sample_rate: u32, channels: u8) -> Self {
        Self {
            sample_rate,
            channels,
            ..Self::default()
        }
    }

    /// Use a fixed serial number instead of a random one.
    pub fn with_serial(mut self, serial: u32) -> Self {
        self.serial = Some(serial);
        self
    }

    /// Append a user comment.
    pub fn with_comment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.comments.push(Comment::new(key, value));
        self
    }
}
