//! RingLog - Fixed-capacity ring buffer of variable-length records
//!
//! # Purpose
//! Provides a bounded in-memory queue of binary items (log lines, messages)
//! for producer/consumer hand-off in resource-constrained environments.
//! Items are framed with a small header, so payloads of any length share one
//! fixed byte array instead of fixed-size slots.
//!
//! # Integration Points
//! - Depends on: caller-provided backing storage (owned or borrowed)
//! - Provides to: logging back-ends, inter-task message queues
//! - Synchronization: none inside [`RingLog`]; wrap it in [`SharedRingLog`]
//!   (or any single lock) when several threads touch it
//!
//! # Architecture
//! - Read and write cursors wrap modulo the capacity
//! - Writes that would run into unread data evict the oldest items first
//!   (FIFO overwrite), or fail when overwrite is not allowed
//! - An item can be assembled across several calls with
//!   [`RingLog::open_append`] / [`RingLog::close_append`]; readers only see it
//!   once it is closed
//!
//! # Testing Strategy
//! - Unit tests: header codec, cursor/wrap arithmetic, eviction, appends
//! - Integration tests: end-to-end scenarios and a `VecDeque` model checked
//!   with proptest
//! - Benchmarks: enqueue/dequeue throughput (criterion)
//!
//! # Example
//!
//! ```
//! use ringlog::RingLog;
//!
//! let mut ring = RingLog::from_storage([0u8; 64]).unwrap();
//! ring.enqueue(b"hello", false).unwrap();
//!
//! let mut out = [0u8; 16];
//! assert_eq!(ring.peek_len(), Some(5));
//! assert_eq!(ring.dequeue(Some(&mut out)).unwrap(), 1);
//! assert_eq!(&out[..5], b"hello");
//! assert!(ring.is_empty());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

mod append;
mod header;
mod ring;
#[cfg(feature = "std")]
mod sync;
#[cfg(feature = "alloc")]
pub mod viz;

pub use append::AppendState;
pub use header::{ItemHeader, HEADER_SIZE, MAX_ITEM_LEN};
pub use ring::{ItemView, Items, RingLog};
#[cfg(feature = "std")]
pub use sync::SharedRingLog;

use thiserror::Error;

/// Error types for ring operations
///
/// An empty ring is not an error: [`RingLog::dequeue`] reports it as `Ok(0)`
/// and the peek operations as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    #[error("Item of {len} bytes can never fit in a {capacity}-byte ring (header included)")]
    CapacityExceeded { len: usize, capacity: usize },

    #[error("Writing {needed} bytes would overwrite unread items ({free} bytes free)")]
    WouldOverwrite { needed: usize, free: usize },

    #[error("Open item holds {open_bytes} bytes, eviction cannot free {needed} bytes")]
    EvictionBlocked { needed: usize, open_bytes: usize },

    #[error("An append is already open")]
    AlreadyOpen,

    #[error("No append is open")]
    NotOpen,

    #[error("Destination too small: item needs {needed} bytes, buffer holds {available}")]
    DestinationTooSmall { needed: usize, available: usize },

    #[error("Invalid capacity {capacity} for {storage}-byte storage")]
    InvalidCapacity { capacity: usize, storage: usize },
}

pub type Result<T> = core::result::Result<T, RingError>;
