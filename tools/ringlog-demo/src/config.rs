//! Demo configuration
//!
//! Loaded from an optional TOML file; command-line flags override it.
//!
//! ```toml
//! [ring]
//! capacity = 256
//! width = 100
//! allow_overwrite = true
//!
//! [messages]
//! max_len = 128
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    pub ring: RingConfig,
    pub messages: MessageConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RingConfig {
    /// Ring capacity in bytes
    pub capacity: usize,
    /// Columns used by the occupancy view
    pub width: usize,
    /// Evict old items instead of dropping new ones
    pub allow_overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MessageConfig {
    /// Longest message text kept in a debug record, in bytes
    pub max_len: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            width: ringlog::viz::DEFAULT_WIDTH,
            allow_overwrite: true,
        }
    }
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self { max_len: 128 }
    }
}

impl DemoConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
