//! The worker loop: a long-lived thread that pops one job at a time, runs
//! it outside the lock, and sleeps on the wake semaphore when the visible
//! queue is empty.

use std::sync::Arc;

use crate::pool::Inner;

/// Body of a single worker thread, spawned lazily from
/// [`crate::pool::Pool::add_work`].
///
/// A private `must_sleep` flag tracks whether the *previous* iteration
/// went to sleep, so `waiting` is decremented exactly once per wake-up
/// rather than once per loop iteration.
pub(crate) fn run(inner: Arc<Inner>) {
    let mut must_sleep = false;

    loop {
        let mut shared = inner.shared.lock().unwrap();

        if must_sleep {
            shared.waiting -= 1;
        }

        // Deliberately reads `queue_count`, not the hidden pause counter:
        // a paused pool always has `queue_count == 0`, so workers sleep
        // through a pause without any special-casing here.
        must_sleep = shared.queue_count == 0;

        if !must_sleep {
            let remaining = shared.queue_count - 1;
            let job = shared.queue.dequeue(remaining);
            shared.queue_count = remaining;

            // A producer blocked on a full queue can now proceed.
            inner.slot.release();

            drop(shared);
            job();
        } else if shared.done {
            drop(shared);
            break;
        } else {
            shared.waiting += 1;
            log::trace!("worker parking: queue empty");
            drop(shared);
            inner.wake.acquire();
        }
    }

    let mut shared = inner.shared.lock().unwrap();
    shared.running -= 1;
    log::debug!("worker exiting, {} still running", shared.running);
}
