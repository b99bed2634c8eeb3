//! Debug records carried through the ring
//!
//! Each record is a level, a capture time and the message text, serialized
//! with bincode into one ring item.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    None,
    Error,
    Warning,
    Info,
    Debug,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::None => "NONE",
            Level::Error => "ERROR",
            Level::Warning => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugRecord {
    pub level: Level,
    /// Whole seconds since the Unix epoch
    pub timestamp: u64,
    /// Fraction of the current second
    pub fracsec: f32,
    pub message: String,
}

impl DebugRecord {
    /// Build a record stamped with the current time
    ///
    /// `message` is cut to at most `max_len` bytes on a char boundary.
    pub fn new(level: Level, message: &str, max_len: usize) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        Self {
            level,
            timestamp: now.as_secs(),
            fracsec: now.subsec_nanos() as f32 / 1e9,
            message: truncate(message, max_len).to_owned(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).context("Failed to encode debug record")
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).context("Failed to decode debug record")
    }
}

fn truncate(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_survives_encoding() {
        let record = DebugRecord::new(Level::Warning, "bytes 3 but also something longer", 128);
        let bytes = record.encode().unwrap();
        assert_eq!(DebugRecord::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn test_message_is_truncated_on_char_boundary() {
        let record = DebugRecord::new(Level::Info, "héllo", 2);
        assert_eq!(record.message, "h");

        let record = DebugRecord::new(Level::Info, "hello", 3);
        assert_eq!(record.message, "hel");
    }

    #[test]
    fn test_garbage_does_not_decode() {
        assert!(DebugRecord::decode(&[0xFF, 0xFF, 0xFF, 0xFF, 0x01]).is_err());
    }
}
