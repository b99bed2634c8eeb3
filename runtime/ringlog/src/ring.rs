//! Ring storage, cursor arithmetic and FIFO eviction
//!
//! # Memory Layout
//! Items are packed back to back with no padding:
//!
//! ```text
//! [hdr|payload....][hdr|payload..][hdr|pay
//! load...]              ^ read           ^ write
//! ```
//!
//! Both the header and the payload may straddle the physical end of the
//! storage. `count` decides emptiness: `read == write` means empty when no
//! item is resident and full otherwise.

use core::fmt;

use crate::append::AppendState;
use crate::header::{ItemHeader, HEADER_SIZE, MAX_ITEM_LEN};
use crate::{Result, RingError};

/// Fixed-capacity ring of variable-length items
///
/// # Type Parameters
/// * `S` - Backing storage, owned (`Vec<u8>`, `[u8; N]`, `Box<[u8]>`) or
///   borrowed (`&mut [u8]`). Only the first `capacity` bytes are used.
///
/// # Concurrency
/// No internal locking. Every call must be serialized by the owner; see
/// [`SharedRingLog`](crate::SharedRingLog) for a ready-made wrapper.
pub struct RingLog<S> {
    storage: S,
    capacity: usize,
    /// Next byte to read
    pub(crate) read: usize,
    /// Next byte to write
    pub(crate) write: usize,
    /// Closed items resident
    pub(crate) count: usize,
    pub(crate) append: AppendState,
}

impl<S> fmt::Debug for RingLog<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingLog")
            .field("capacity", &self.capacity)
            .field("read", &self.read)
            .field("write", &self.write)
            .field("count", &self.count)
            .field("append", &self.append)
            .finish()
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> RingLog<S> {
    /// Create a ring over the first `capacity` bytes of `storage`
    ///
    /// # Errors
    /// Returns `RingError::InvalidCapacity` if `capacity` is zero or larger
    /// than the storage. A capacity too small for any item is accepted; every
    /// write is then rejected with `CapacityExceeded`.
    pub fn new(storage: S, capacity: usize) -> Result<Self> {
        let available = storage.as_ref().len();
        if capacity == 0 || capacity > available {
            return Err(RingError::InvalidCapacity {
                capacity,
                storage: available,
            });
        }

        Ok(Self {
            storage,
            capacity,
            read: 0,
            write: 0,
            count: 0,
            append: AppendState::Closed,
        })
    }

    /// Create a ring that uses the whole storage
    pub fn from_storage(storage: S) -> Result<Self> {
        let capacity = storage.as_ref().len();
        Self::new(storage, capacity)
    }

    /// Drop every item and any open append
    pub fn reset(&mut self) {
        self.read = 0;
        self.write = 0;
        self.count = 0;
        self.append = AppendState::Closed;
    }

    /// Release the backing storage
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Capacity in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of closed items resident
    pub fn count(&self) -> usize {
        self.count
    }

    /// True when no closed item can be read
    ///
    /// An open append may still hold bytes.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Offset of the oldest item's header
    pub fn read_cursor(&self) -> usize {
        self.read
    }

    /// Offset where the next write lands
    pub fn write_cursor(&self) -> usize {
        self.write
    }

    /// Bytes held by resident items, headers and any open item included
    pub fn used(&self) -> usize {
        if self.write == self.read {
            if self.occupied() {
                self.capacity
            } else {
                0
            }
        } else if self.write > self.read {
            self.write - self.read
        } else {
            self.capacity - self.read + self.write
        }
    }

    /// Bytes that can be written without evicting anything
    pub fn free(&self) -> usize {
        self.capacity - self.used()
    }

    /// Write one item at the write cursor
    ///
    /// While an append is open the bytes extend the open item instead of
    /// starting a new one.
    ///
    /// # Arguments
    /// * `data` - Payload bytes
    /// * `allow_overwrite` - Evict the oldest items when there is not enough room
    ///
    /// # Returns
    /// Number of items evicted to make room
    ///
    /// # Errors
    /// - `CapacityExceeded` if `HEADER_SIZE + data.len() >= capacity - 1`
    /// - `WouldOverwrite` if room is needed and `allow_overwrite` is false
    /// - `EvictionBlocked` if only the open item stands in the way
    ///
    /// No state changes on any error.
    pub fn enqueue(&mut self, data: &[u8], allow_overwrite: bool) -> Result<usize> {
        self.ensure_can_fit(data.len())?;

        let open_len = self.open_len();
        if let Some(len) = open_len {
            if len + data.len() > MAX_ITEM_LEN {
                return Err(RingError::CapacityExceeded {
                    len: len + data.len(),
                    capacity: self.capacity,
                });
            }
            if data.is_empty() {
                return Ok(0);
            }
        }

        let needed = match open_len {
            Some(_) => data.len(),
            None => HEADER_SIZE + data.len(),
        };
        let evicted = self.make_room(needed, allow_overwrite)?;

        let at = self.write;
        match self.append {
            AppendState::Open { header_at } => self.extend_open(header_at, data),
            AppendState::Closed => {
                let next = self.write_header(at, ItemHeader::closed(data.len() as u32));
                self.write = self.copy_in(next, data);
                self.count += 1;
            }
        }

        log::debug!(
            "Insert {} bytes at {} (evicted {})",
            data.len(),
            at,
            evicted
        );
        Ok(evicted)
    }

    /// Remove the oldest closed item
    ///
    /// # Arguments
    /// * `dst` - Receives the payload; `None` discards it
    ///
    /// # Returns
    /// Item count before the call; `0` means the ring was empty and nothing
    /// was read
    ///
    /// # Errors
    /// Returns `RingError::DestinationTooSmall` if `dst` is shorter than the
    /// item. The item stays in the ring.
    pub fn dequeue(&mut self, dst: Option<&mut [u8]>) -> Result<usize> {
        let previous = self.count;
        if previous == 0 {
            return Ok(0);
        }

        let header = self.read_header(self.read);
        debug_assert!(!header.open, "open item reached by the read cursor");
        let len = header.len as usize;
        let payload_at = (self.read + HEADER_SIZE) % self.capacity;

        if let Some(dst) = dst {
            if dst.len() < len {
                return Err(RingError::DestinationTooSmall {
                    needed: len,
                    available: dst.len(),
                });
            }
            self.copy_out(payload_at, &mut dst[..len]);
        }

        self.read = (payload_at + len) % self.capacity;
        self.count -= 1;
        Ok(previous)
    }

    /// Remove the oldest closed item into a new vector
    #[cfg(feature = "alloc")]
    pub fn pop(&mut self) -> Option<alloc::vec::Vec<u8>> {
        let len = self.peek_len()?;
        let mut out = alloc::vec![0u8; len];
        match self.dequeue(Some(&mut out)) {
            Ok(previous) => {
                debug_assert!(previous > 0, "peeked item vanished before dequeue");
                Some(out)
            }
            Err(err) => unreachable!("dequeue into a buffer sized by peek_len failed: {err}"),
        }
    }

    /// Length of the oldest closed item, `None` when empty
    pub fn peek_len(&self) -> Option<usize> {
        if self.count == 0 {
            return None;
        }
        Some(self.read_header(self.read).len as usize)
    }

    /// Copy the start of the oldest closed item without removing it
    ///
    /// # Returns
    /// Bytes copied, `min(dst.len(), item length)`; `None` when empty
    pub fn peek(&self, dst: &mut [u8]) -> Option<usize> {
        let len = self.peek_len()?;
        let copied = len.min(dst.len());
        self.copy_out((self.read + HEADER_SIZE) % self.capacity, &mut dst[..copied]);
        Some(copied)
    }

    /// Iterate over resident items without consuming them
    ///
    /// Yields every closed item oldest first, then the open item if an
    /// append is in progress.
    pub fn items(&self) -> Items<'_, S> {
        Items {
            ring: self,
            offset: self.read,
            closed_left: self.count,
            open_left: self.is_open(),
        }
    }

    fn ensure_can_fit(&self, len: usize) -> Result<()> {
        if len > MAX_ITEM_LEN || HEADER_SIZE + len >= self.capacity.saturating_sub(1) {
            log::debug!(
                "Rejecting {} bytes: never fits in {} bytes",
                len,
                self.capacity
            );
            return Err(RingError::CapacityExceeded {
                len,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Evict oldest items until `needed` bytes fit at the write cursor
    pub(crate) fn make_room(&mut self, needed: usize, allow_overwrite: bool) -> Result<usize> {
        if self.fits(needed) {
            return Ok(0);
        }

        if !allow_overwrite {
            log::debug!(
                "Rejecting {} bytes: would overwrite ({} free)",
                needed,
                self.free()
            );
            return Err(RingError::WouldOverwrite {
                needed,
                free: self.free(),
            });
        }

        // Evicting every closed item leaves only the open item behind.
        let open_bytes = self.open_footprint();
        if needed > self.capacity - open_bytes {
            log::debug!(
                "Rejecting {} bytes: open item holds {} bytes",
                needed,
                open_bytes
            );
            return Err(RingError::EvictionBlocked { needed, open_bytes });
        }

        let limit = self.count;
        let mut evicted = 0;
        while !self.fits(needed) {
            if evicted == limit || self.dequeue(None)? == 0 {
                log::error!(
                    "Eviction stalled after {} items with {} bytes needed",
                    evicted,
                    needed
                );
                return Err(RingError::EvictionBlocked { needed, open_bytes });
            }
            evicted += 1;
            log::trace!("Evicted oldest item, read cursor now {}", self.read);
        }
        Ok(evicted)
    }

    /// Whether `needed` bytes can be written without passing the read cursor
    ///
    /// With `end = write + needed` unwrapped, the write is safe when:
    /// - it does not wrap and the write cursor is at or ahead of the read cursor
    /// - it does not wrap, the write cursor is behind, and `end <= read`
    /// - it wraps, the write cursor is at or ahead, and `end <= read + capacity`
    pub(crate) fn fits(&self, needed: usize) -> bool {
        if needed == 0 {
            return true;
        }
        if self.write == self.read && self.occupied() {
            return false;
        }

        let end = self.write + needed;
        let wraps = end > self.capacity;
        let ahead = self.write >= self.read;
        match (wraps, ahead) {
            (false, true) => true,
            (false, false) => end <= self.read,
            (true, true) => end <= self.read + self.capacity,
            (true, false) => false,
        }
    }

    fn occupied(&self) -> bool {
        self.count > 0 || self.is_open()
    }

    pub(crate) fn read_header(&self, offset: usize) -> ItemHeader {
        let mut raw = [0u8; HEADER_SIZE];
        self.copy_out(offset, &mut raw);
        ItemHeader::from_bytes(raw)
    }

    /// Returns the offset just past the header
    pub(crate) fn write_header(&mut self, offset: usize, header: ItemHeader) -> usize {
        self.copy_in(offset, &header.to_bytes())
    }

    /// Copy `src` in at `offset`, wrapping at the capacity
    ///
    /// Returns the offset just past the copied bytes.
    pub(crate) fn copy_in(&mut self, offset: usize, src: &[u8]) -> usize {
        let capacity = self.capacity;
        let buf = &mut self.storage.as_mut()[..capacity];
        let first = src.len().min(capacity - offset);
        buf[offset..offset + first].copy_from_slice(&src[..first]);
        buf[..src.len() - first].copy_from_slice(&src[first..]);
        (offset + src.len()) % capacity
    }

    /// Copy `dst.len()` bytes out from `offset`, wrapping at the capacity
    pub(crate) fn copy_out(&self, offset: usize, dst: &mut [u8]) {
        let (first, second) = self.segments(offset, dst.len());
        let (head, tail) = dst.split_at_mut(first.len());
        head.copy_from_slice(first);
        tail.copy_from_slice(second);
    }

    /// `len` bytes from `offset` as up to two slices in logical order
    fn segments(&self, offset: usize, len: usize) -> (&[u8], &[u8]) {
        let buf = &self.storage.as_ref()[..self.capacity];
        let first = len.min(self.capacity - offset);
        (&buf[offset..offset + first], &buf[..len - first])
    }
}

#[cfg(feature = "alloc")]
impl RingLog<alloc::vec::Vec<u8>> {
    /// Create a ring over a freshly zeroed vector
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::new(alloc::vec![0u8; capacity], capacity)
    }
}

/// Read-only view of one resident item
#[derive(Debug, Clone, Copy)]
pub struct ItemView<'a> {
    offset: usize,
    open: bool,
    first: &'a [u8],
    second: &'a [u8],
}

impl<'a> ItemView<'a> {
    /// Offset of the item header in the storage
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.first.len() + self.second.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Item is still being appended
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Bytes occupied in the ring, header included
    pub fn footprint(&self) -> usize {
        HEADER_SIZE + self.len()
    }

    /// Payload as up to two slices; the second is non-empty when it wraps
    pub fn segments(&self) -> (&'a [u8], &'a [u8]) {
        (self.first, self.second)
    }

    /// Copy the start of the payload into `dst`, returning the bytes copied
    pub fn copy_to(&self, dst: &mut [u8]) -> usize {
        let copied = self.len().min(dst.len());
        let from_first = copied.min(self.first.len());
        dst[..from_first].copy_from_slice(&self.first[..from_first]);
        dst[from_first..copied].copy_from_slice(&self.second[..copied - from_first]);
        copied
    }

    #[cfg(feature = "alloc")]
    pub fn to_vec(&self) -> alloc::vec::Vec<u8> {
        let mut out = alloc::vec::Vec::with_capacity(self.len());
        out.extend_from_slice(self.first);
        out.extend_from_slice(self.second);
        out
    }
}

/// Iterator returned by [`RingLog::items`]
pub struct Items<'a, S> {
    ring: &'a RingLog<S>,
    offset: usize,
    closed_left: usize,
    open_left: bool,
}

impl<'a, S: AsRef<[u8]> + AsMut<[u8]>> Iterator for Items<'a, S> {
    type Item = ItemView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let open = if self.closed_left > 0 {
            self.closed_left -= 1;
            false
        } else if self.open_left {
            self.open_left = false;
            true
        } else {
            return None;
        };

        let ring = self.ring;
        let header = ring.read_header(self.offset);
        debug_assert_eq!(header.open, open);
        let payload_at = (self.offset + HEADER_SIZE) % ring.capacity;
        let (first, second) = ring.segments(payload_at, header.len as usize);

        let view = ItemView {
            offset: self.offset,
            open,
            first,
            second,
        };
        self.offset = (self.offset + header.footprint()) % ring.capacity;
        Some(view)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.closed_left + usize::from(self.open_left);
        (left, Some(left))
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> ExactSizeIterator for Items<'_, S> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(capacity: usize) -> RingLog<Vec<u8>> {
        RingLog::with_capacity(capacity).unwrap()
    }

    fn state(r: &RingLog<Vec<u8>>) -> (usize, usize, usize) {
        (r.read_cursor(), r.write_cursor(), r.count())
    }

    #[test]
    fn test_invalid_capacity() {
        let result = RingLog::new(vec![0u8; 8], 0);
        assert_eq!(
            result.unwrap_err(),
            RingError::InvalidCapacity { capacity: 0, storage: 8 }
        );

        let result = RingLog::new(vec![0u8; 8], 9);
        assert_eq!(
            result.unwrap_err(),
            RingError::InvalidCapacity { capacity: 9, storage: 8 }
        );
    }

    #[test]
    fn test_capacity_may_be_smaller_than_storage() {
        let mut mem = [0xEEu8; 100];
        let mut r = RingLog::new(&mut mem[..], 50).unwrap();
        assert_eq!(r.capacity(), 50);
        r.enqueue(&[1u8; 40], false).unwrap();
        drop(r);
        assert!(mem[50..].iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn test_roundtrip_preserves_order_and_bytes() {
        let mut r = ring(64);
        r.enqueue(b"alpha", false).unwrap();
        r.enqueue(b"", false).unwrap();
        r.enqueue(b"gamma!", false).unwrap();

        let mut out = [0u8; 16];
        assert_eq!(r.dequeue(Some(&mut out)).unwrap(), 3);
        assert_eq!(&out[..5], b"alpha");
        assert_eq!(r.peek_len(), Some(0));
        assert_eq!(r.dequeue(Some(&mut out)).unwrap(), 2);
        assert_eq!(r.pop().unwrap(), b"gamma!");
        assert!(r.is_empty());
        assert_eq!(r.dequeue(Some(&mut out)).unwrap(), 0);
    }

    #[test]
    fn test_second_small_item_fits_without_eviction() {
        let mut r = ring(50);
        assert_eq!(r.enqueue(b"data123", true).unwrap(), 0);
        assert_eq!(r.enqueue(b"145234523452", true).unwrap(), 0);
        assert_eq!(r.count(), 2);
    }

    #[test]
    fn test_overwrite_evicts_oldest_when_item_no_longer_fits() {
        let mut r = ring(50);
        assert_eq!(r.enqueue(b"data123", true).unwrap(), 0);

        let blob = [0x5Au8; 36];
        assert_eq!(r.enqueue(&blob, true).unwrap(), 1);
        assert_eq!(r.count(), 1);
        assert_eq!(r.pop().unwrap(), blob);
    }

    #[test]
    fn test_item_that_never_fits_is_rejected() {
        let mut r = ring(10);
        for allow in [false, true] {
            assert_eq!(
                r.enqueue(&[0u8; 5], allow),
                Err(RingError::CapacityExceeded { len: 5, capacity: 10 })
            );
        }
        assert_eq!(r.enqueue(&[0u8; 4], false).unwrap(), 0);
    }

    #[test]
    fn test_capacity_rejection_leaves_full_ring_untouched() {
        let mut r = ring(32);
        r.enqueue(&[1u8; 12], false).unwrap();
        r.enqueue(&[2u8; 12], false).unwrap();
        let before = state(&r);

        assert!(matches!(
            r.enqueue(&[3u8; 27], true),
            Err(RingError::CapacityExceeded { .. })
        ));
        assert_eq!(state(&r), before);
    }

    #[test]
    fn test_overwrite_disallowed_leaves_state_unchanged() {
        let mut r = ring(32);
        r.enqueue(&[1u8; 10], false).unwrap();
        r.enqueue(&[2u8; 10], false).unwrap();
        let before = state(&r);

        assert_eq!(
            r.enqueue(b"x", false),
            Err(RingError::WouldOverwrite { needed: 5, free: 4 })
        );
        assert_eq!(state(&r), before);
        assert_eq!(r.pop().unwrap(), [1u8; 10]);
        assert_eq!(r.pop().unwrap(), [2u8; 10]);
    }

    #[test]
    fn test_fifo_eviction_removes_exactly_the_oldest() {
        let mut r = ring(64);
        for tag in b"abcd" {
            r.enqueue(&[*tag; 10], false).unwrap();
        }

        assert_eq!(r.enqueue(&[b'e'; 20], true).unwrap(), 2);
        assert_eq!(r.count(), 3);
        assert_eq!(r.pop().unwrap(), [b'c'; 10]);
        assert_eq!(r.pop().unwrap(), [b'd'; 10]);
        assert_eq!(r.pop().unwrap(), [b'e'; 20]);
    }

    #[test]
    fn test_exactly_full_ring() {
        let mut r = ring(32);
        r.enqueue(&[1u8; 12], false).unwrap();
        r.enqueue(&[2u8; 12], false).unwrap();

        assert_eq!(r.read_cursor(), r.write_cursor());
        assert_eq!(r.used(), 32);
        assert_eq!(r.free(), 0);
        assert_eq!(
            r.enqueue(b"", false),
            Err(RingError::WouldOverwrite { needed: 4, free: 0 })
        );

        assert_eq!(r.pop().unwrap(), [1u8; 12]);
        assert_eq!(r.pop().unwrap(), [2u8; 12]);
        assert!(r.is_empty());
        assert_eq!(r.used(), 0);
    }

    #[test]
    fn test_payload_wraps_around_storage_end() {
        let mut r = ring(20);
        r.enqueue(&[9u8; 6], false).unwrap();
        r.dequeue(None).unwrap();

        let data: Vec<u8> = (0..8).collect();
        assert_eq!(r.enqueue(&data, false).unwrap(), 0);
        assert_eq!(r.write_cursor(), 2);

        let view = r.items().next().unwrap();
        let (first, second) = view.segments();
        assert_eq!((first.len(), second.len()), (6, 2));
        assert_eq!(r.pop().unwrap(), data);
    }

    #[test]
    fn test_pop_returns_items_of_every_length() {
        let mut r = ring(32);
        r.enqueue(b"", false).unwrap();
        r.enqueue(&[7u8; 20], false).unwrap();

        assert_eq!(r.pop(), Some(Vec::new()));
        assert_eq!(r.pop(), Some(vec![7u8; 20]));
        assert_eq!(r.pop(), None);
        assert_eq!(state(&r), (28, 28, 0));
    }

    #[test]
    fn test_dequeue_without_destination_discards() {
        let mut r = ring(32);
        r.enqueue(b"one", false).unwrap();
        r.enqueue(b"two", false).unwrap();

        assert_eq!(r.dequeue(None).unwrap(), 2);
        assert_eq!(r.pop().unwrap(), b"two");
    }

    #[test]
    fn test_destination_too_small_keeps_item() {
        let mut r = ring(32);
        r.enqueue(b"twelve bytes", false).unwrap();
        let before = state(&r);

        let mut out = [0u8; 4];
        assert_eq!(
            r.dequeue(Some(&mut out)),
            Err(RingError::DestinationTooSmall { needed: 12, available: 4 })
        );
        assert_eq!(state(&r), before);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut r = ring(32);
        assert_eq!(r.peek_len(), None);
        assert_eq!(r.peek(&mut [0u8; 4]), None);

        r.enqueue(b"peekaboo", false).unwrap();
        let before = state(&r);

        let mut short = [0u8; 4];
        assert_eq!(r.peek(&mut short), Some(4));
        assert_eq!(&short, b"peek");

        let mut long = [0u8; 16];
        assert_eq!(r.peek(&mut long), Some(8));
        assert_eq!(&long[..8], b"peekaboo");
        assert_eq!(r.peek_len(), Some(8));
        assert_eq!(state(&r), before);
    }

    #[test]
    fn test_count_arithmetic() {
        let mut r = ring(128);
        for i in 0..6u8 {
            r.enqueue(&[i; 5], false).unwrap();
        }
        for _ in 0..4 {
            r.dequeue(None).unwrap();
        }
        assert_eq!(r.count(), 2);
    }

    #[test]
    fn test_cursor_cases_match_free_space() {
        let capacity = 16;
        let mut r = ring(capacity);
        for read in 0..capacity {
            for write in 0..capacity {
                r.read = read;
                r.write = write;
                r.count = usize::from(read != write);
                for needed in 1..=capacity {
                    assert_eq!(
                        r.fits(needed),
                        needed <= r.free(),
                        "read={read} write={write} needed={needed}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_items_iterates_oldest_first() {
        let mut r = ring(64);
        r.enqueue(b"first", false).unwrap();
        r.enqueue(b"second", false).unwrap();
        let before = state(&r);

        let payloads: Vec<Vec<u8>> = r.items().map(|item| item.to_vec()).collect();
        assert_eq!(payloads, vec![b"first".to_vec(), b"second".to_vec()]);
        assert_eq!(r.items().len(), 2);
        assert_eq!(state(&r), before);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut r = ring(32);
        r.enqueue(b"stale", false).unwrap();
        r.open_append(false).unwrap();
        r.reset();

        assert_eq!(state(&r), (0, 0, 0));
        assert!(!r.is_open());
        assert_eq!(r.used(), 0);
    }
}
