//! The fixed-capacity ring buffer underlying the pool's work queue.
//!
//! This type owns only the slot storage and the `head` pointer — it has no
//! locking and no notion of "paused" vs. "running" counters. The active
//! count (`queue_count` or the hidden pause counter) lives in
//! [`crate::pool::Pool`] and is always passed in by the caller, which also
//! holds the pool's mutex for the duration of every call here.

/// A contiguous array used as a circular buffer of capacity `cap`.
///
/// Enqueue index = `(head + count) mod cap`. Dequeue index = `head`;
/// dequeuing advances `head` by one modulo `cap`, and resets `head` to `0`
/// once the queue becomes empty — a locality touch-up that changes nothing
/// observable, since an empty ring's `head` has no enqueued slot to be
/// "at".
pub struct RingQueue<T> {
    slots: Box<[Option<T>]>,
    cap: usize,
    head: usize,
}

impl<T> RingQueue<T> {
    /// Creates an empty ring buffer with room for exactly `cap` entries.
    pub fn with_capacity(cap: usize) -> Self {
        assert!(cap > 0, "ring queue capacity must be positive");
        Self {
            slots: (0..cap).map(|_| None).collect(),
            cap,
            head: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// Writes `item` into the slot `count` positions past `head`, wrapping
    /// modulo capacity. `count` is the active count *before* this item is
    /// counted — i.e. the number of entries already occupying the buffer.
    pub fn enqueue(&mut self, count: u32, item: T) {
        let index = (self.head + count as usize) % self.cap;
        debug_assert!(
            self.slots[index].is_none(),
            "enqueue target slot must be vacant"
        );
        self.slots[index] = Some(item);
    }

    /// Removes and returns the entry at `head`, advancing `head` by one
    /// slot modulo capacity. `new_count` is the active count *after* this
    /// removal is accounted for; when it reaches zero, `head` is reset to
    /// `0` for locality.
    pub fn dequeue(&mut self, new_count: u32) -> T {
        let item = self.slots[self.head]
            .take()
            .expect("slot at head must be occupied when dequeuing");
        self.head = (self.head + 1) % self.cap;
        if new_count == 0 {
            self.head = 0;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_dequeue_preserves_fifo_order() {
        let mut q: RingQueue<u32> = RingQueue::with_capacity(4);
        q.enqueue(0, 10);
        q.enqueue(1, 20);
        q.enqueue(2, 30);

        assert_eq!(q.dequeue(2), 10);
        assert_eq!(q.dequeue(1), 20);
        assert_eq!(q.dequeue(0), 30);
    }

    #[test]
    fn head_resets_to_zero_once_empty() {
        let mut q: RingQueue<u32> = RingQueue::with_capacity(4);
        q.enqueue(0, 1);
        q.enqueue(1, 2);
        let _ = q.dequeue(1);
        assert_eq!(q.head(), 1);
        let _ = q.dequeue(0);
        assert_eq!(q.head(), 0);
    }

    #[test]
    fn enqueue_wraps_around_capacity() {
        let mut q: RingQueue<u32> = RingQueue::with_capacity(3);
        q.enqueue(0, 1);
        q.enqueue(1, 2);
        assert_eq!(q.dequeue(1), 1); // head now 1, count 1
        // enqueue at (1 + 1) % 3 == 2
        q.enqueue(1, 3);
        assert_eq!(q.dequeue(1), 2);
        assert_eq!(q.dequeue(0), 3);
    }

    #[test]
    #[should_panic]
    fn zero_capacity_panics() {
        let _: RingQueue<u32> = RingQueue::with_capacity(0);
    }
}
