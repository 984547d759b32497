//! Fixed-capacity circular buffer with FIFO eviction.
//!
//! Entries are pushed at the back and evicted from the front. Pushing into a
//! full buffer drops the oldest entry first, so the buffer never holds more
//! than `capacity` entries and never reallocates.

/// A bounded FIFO cache of entries.
pub struct BoundedCache<T> {
    slots: Box<[Option<T>]>,
    capacity: usize,
    head: usize,
    len: usize,
}

impl<T> BoundedCache<T> {
    /// Create an empty cache holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "BoundedCache capacity must be non-zero");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            capacity,
            head: 0,
            len: 0,
        }
    }

    /// Maximum number of entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    #[inline]
    fn slot_index(&self, offset: usize) -> usize {
        (self.head + offset) % self.capacity
    }

    /// Append an entry, dropping the oldest one first when full.
    /// Returns true if an entry was evicted.
    pub fn push_back(&mut self, entry: T) -> bool {
        let evicted = self.is_full();
        if evicted {
            drop(self.pop_front());
        }
        let tail = self.slot_index(self.len);
        self.slots[tail] = Some(entry);
        self.len += 1;
        evicted
    }

    /// Remove and return the oldest entry.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let entry = self.slots[self.head].take();
        self.head = (self.head + 1) % self.capacity;
        self.len -= 1;
        entry
    }

    /// Oldest entry.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Newest entry.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|last| self.get(last))
    }

    /// Entry at `offset` from the front.
    pub fn get(&self, offset: usize) -> Option<&T> {
        if offset >= self.len {
            return None;
        }
        self.slots[self.slot_index(offset)].as_ref()
    }

    /// Entries from oldest to newest. Reverse it to search newest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |offset| self.slots[self.slot_index(offset)].as_ref())
    }

    /// Drop every entry, oldest first. Capacity is unchanged.
    pub fn reset(&mut self) {
        while self.pop_front().is_some() {}
        self.head = 0;
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for BoundedCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedCache")
            .field("capacity", &self.capacity)
            .field("entries", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}
