//! Streaming appends: one item assembled across several writes
//!
//! `open_append` reserves a header flagged open at the write cursor. Every
//! following `enqueue` lands right after the previous payload and grows the
//! reserved header's length in place. `close_append` clears the flag and
//! makes the item visible to readers. Readers stop at an open header, so the
//! open item is always the newest one and eviction never touches it.

use crate::header::{ItemHeader, HEADER_SIZE};
use crate::ring::RingLog;
use crate::{Result, RingError};

/// Append state of a ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppendState {
    /// Every resident item is finished
    #[default]
    Closed,
    /// An item is being assembled
    Open {
        /// Offset of the open item's header
        header_at: usize,
    },
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> RingLog<S> {
    /// Start an item that is filled by subsequent `enqueue` calls
    ///
    /// Reserves the item header with the same capacity and eviction rules as
    /// a zero-length `enqueue`. The item is not counted until
    /// [`close_append`](Self::close_append).
    ///
    /// # Returns
    /// Number of items evicted to reserve the header
    ///
    /// # Errors
    /// - `AlreadyOpen` if an append is in progress
    /// - `CapacityExceeded` / `WouldOverwrite` as for `enqueue`; the ring stays
    ///   closed
    pub fn open_append(&mut self, allow_overwrite: bool) -> Result<usize> {
        if self.is_open() {
            return Err(RingError::AlreadyOpen);
        }
        if HEADER_SIZE >= self.capacity().saturating_sub(1) {
            return Err(RingError::CapacityExceeded {
                len: 0,
                capacity: self.capacity(),
            });
        }

        let evicted = self.make_room(HEADER_SIZE, allow_overwrite)?;
        let header_at = self.write;
        self.write = self.write_header(header_at, ItemHeader::open(0));
        self.append = AppendState::Open { header_at };

        log::debug!("Opened item at {} (evicted {})", header_at, evicted);
        Ok(evicted)
    }

    /// Finish the open item and make it readable
    ///
    /// # Errors
    /// Returns `RingError::NotOpen` if no append is in progress
    pub fn close_append(&mut self) -> Result<()> {
        let AppendState::Open { header_at } = self.append else {
            return Err(RingError::NotOpen);
        };

        let mut header = self.read_header(header_at);
        header.open = false;
        self.write_header(header_at, header);
        self.append = AppendState::Closed;
        self.count += 1;

        log::debug!("Closed item at {} ({} bytes)", header_at, header.len);
        Ok(())
    }

    /// True while an append is in progress
    pub fn is_open(&self) -> bool {
        matches!(self.append, AppendState::Open { .. })
    }

    pub fn append_state(&self) -> AppendState {
        self.append
    }

    /// Payload bytes written so far to the open item
    pub(crate) fn open_len(&self) -> Option<usize> {
        match self.append {
            AppendState::Open { header_at } => Some(self.read_header(header_at).len as usize),
            AppendState::Closed => None,
        }
    }

    /// Ring bytes held by the open item, header included
    pub(crate) fn open_footprint(&self) -> usize {
        match self.append {
            AppendState::Open { header_at } => {
                // The open item is the newest, so landing back on its header
                // means it fills the whole ring.
                match (self.write + self.capacity() - header_at) % self.capacity() {
                    0 => self.capacity(),
                    span => span,
                }
            }
            AppendState::Closed => 0,
        }
    }

    /// Append `data` to the open item; room must already be made
    pub(crate) fn extend_open(&mut self, header_at: usize, data: &[u8]) {
        let mut header = self.read_header(header_at);
        header.len += data.len() as u32;
        self.write_header(header_at, header);
        self.write = self.copy_in(self.write, data);
    }
}
