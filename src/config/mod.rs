mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

use crate::error::Error;

/// Load muxer configuration from a TOML file
pub fn load_config(path: &Path) -> Result<MuxerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: MuxerConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// Validate configuration
pub fn validate_config(config: &MuxerConfig) -> crate::Result<()> {
    if config.sample_rate == 0 {
        return Err(Error::invalid_config("sample rate must be positive"));
    }
    if config.channels == 0 {
        return Err(Error::invalid_config("channel count must be positive"));
    }
    if config.channels > 2 {
        return Err(Error::unsupported(format!(
            "{} channels need a surround mapping table; only mono and stereo are supported",
            config.channels
        )));
    }

    for comment in &config.comments {
        if comment.key.is_empty() {
            return Err(Error::invalid_config("comment key cannot be empty"));
        }
        if !comment
            .key
            .bytes()
            .all(|b| (0x20..=0x7d).contains(&b) && b != b'=')
        {
            return Err(Error::invalid_config(format!(
                "comment key {:?} must be printable ASCII without '='",
                comment.key
            )));
        }
    }

    Ok(())
}
