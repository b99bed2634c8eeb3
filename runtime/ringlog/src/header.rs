//! Item header codec
//!
//! Every item starts with a fixed 4-byte header: a little-endian `u32` whose
//! low 31 bits carry the payload length and whose top bit marks an item that
//! is still open for appends.

use static_assertions::const_assert_eq;

/// Size of the serialized item header in bytes
pub const HEADER_SIZE: usize = 4;

/// Largest payload length the header can describe
pub const MAX_ITEM_LEN: usize = (OPEN_FLAG - 1) as usize;

const OPEN_FLAG: u32 = 1 << 31;

const_assert_eq!(HEADER_SIZE, core::mem::size_of::<u32>());

/// Decoded item header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemHeader {
    /// Payload length in bytes (header excluded)
    pub len: u32,
    /// Item is still being appended and is invisible to readers
    pub open: bool,
}

impl ItemHeader {
    /// Header of a finished item
    pub const fn closed(len: u32) -> Self {
        Self { len, open: false }
    }

    /// Header of an item still accepting appends
    pub const fn open(len: u32) -> Self {
        Self { len, open: true }
    }

    /// Serialize into the fixed header slot
    ///
    /// # Panics
    /// Debug builds panic if `len` does not fit in 31 bits; callers reject
    /// such lengths before building a header.
    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        debug_assert!(self.len & OPEN_FLAG == 0, "item length overflows header");
        let mut raw = self.len & !OPEN_FLAG;
        if self.open {
            raw |= OPEN_FLAG;
        }
        raw.to_le_bytes()
    }

    /// Deserialize from the fixed header slot
    pub fn from_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        let raw = u32::from_le_bytes(bytes);
        Self {
            len: raw & !OPEN_FLAG,
            open: raw & OPEN_FLAG != 0,
        }
    }

    /// Total bytes the item occupies in the ring
    pub fn footprint(&self) -> usize {
        HEADER_SIZE + self.len as usize
    }
}
