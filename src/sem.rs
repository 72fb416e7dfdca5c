//! A counting semaphore built on a `crossbeam-channel`.
//!
//! `std` has no semaphore type. A `crossbeam_channel` used as a token
//! bucket gets you one cheaply: a full channel means "no tokens
//! available", `send` posts a token, `recv` consumes one. This wraps that
//! trick once so both the wake semaphore and the slot semaphore share the
//! same implementation instead of duplicating the channel dance twice.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError, TrySendError};

/// A counting semaphore.
///
/// The slot semaphore has a natural upper bound (`queue_size`: the number
/// of free ring slots can never exceed the ring's capacity) and is backed
/// by a bounded channel sized to match. The wake semaphore has no such
/// bound — two producers can each observe a worker as "waiting" and both
/// post a wakeup before that worker consumes either one, the same way a
/// POSIX semaphore's value space tolerates more posts than waiters — so it
/// is backed by an unbounded channel instead; `release` on it can never
/// fail.
pub struct Semaphore {
    tx: Sender<()>,
    rx: Receiver<()>,
    bound: Option<usize>,
}

impl Semaphore {
    /// Creates a semaphore bounded at `capacity` tokens, starting with
    /// `initial` already posted. Used for the slot semaphore, where the
    /// bound is a true invariant — free slots can never outnumber ring
    /// capacity.
    pub fn bounded(capacity: usize, initial: usize) -> Self {
        debug_assert!(initial <= capacity);
        let (tx, rx) = bounded(capacity.max(1));
        for _ in 0..initial {
            tx.try_send(()).expect("initial fill fits in capacity");
        }
        Self { tx, rx, bound: Some(capacity) }
    }

    /// Creates a semaphore with no upper bound on its value. Used for the
    /// wake semaphore, where transient over-posting under races is benign.
    pub fn unbounded(initial: usize) -> Self {
        let (tx, rx) = unbounded();
        for _ in 0..initial {
            tx.send(()).expect("fresh channel cannot be disconnected");
        }
        Self { tx, rx, bound: None }
    }

    /// Blocks the calling thread until a token is available, then consumes
    /// it. Equivalent to `sem_wait`.
    pub fn acquire(&self) {
        self.rx
            .recv()
            .expect("semaphore channel never disconnects while Pool is alive");
    }

    /// Consumes a token without blocking. Returns `true` if one was
    /// available. Equivalent to `sem_trywait`.
    pub fn try_acquire(&self) -> bool {
        match self.rx.try_recv() {
            Ok(()) => true,
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                unreachable!("semaphore channel never disconnects while Pool is alive")
            }
        }
    }

    /// Posts one token, waking at most one waiter blocked in `acquire`.
    /// Equivalent to `sem_post`. Never blocks.
    ///
    /// On a bounded semaphore, exceeding `capacity` indicates an invariant
    /// violation in the caller and is reported via `debug_assert!` in
    /// debug builds; release builds drop the surplus token, which is still
    /// safe because it can only happen if some other invariant has already
    /// been broken.
    pub fn release(&self) {
        match self.tx.try_send(()) {
            Ok(()) => {}
            Err(TrySendError::Full(())) => {
                debug_assert!(
                    self.bound.is_none(),
                    "bounded semaphore released beyond its capacity"
                );
            }
            Err(TrySendError::Disconnected(())) => {
                unreachable!("semaphore channel never disconnects while Pool is alive")
            }
        }
    }
}
