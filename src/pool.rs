//! The pool aggregate, the submit protocol, pause/resume/clear, the
//! finish-and-drain shutdown, and the read-only observers.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::config::{DEFAULT_THREADS_NUM, MIN_QUEUE_SIZE, QUEUE_FACTOR};
use crate::cores::count_cores;
use crate::queue::RingQueue;
use crate::sem::Semaphore;
use crate::worker;

/// A unit of work: a one-shot callable carrying its own captured data.
///
/// A single polymorphic value the compiler can prove is safe to move across
/// the submit/execute boundary — there is no `unsafe` anywhere in this crate
/// as a result.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Whether the pool is currently running normally or logically paused.
///
/// A tagged variant rather than a sentinel count: it is a compile-time
/// impossibility to be both paused and not paused at once, and the hidden
/// count only exists in the variant that actually needs it.
enum Phase {
    Running,
    /// Holds the number of tasks hidden from workers while paused.
    Paused { hidden: u32 },
}

/// All mutable pool state, guarded by a single mutex. Deliberately
/// coarse-grained: splitting this into separate producer/consumer/state
/// locks would complicate the pause-epoch invariant for no real benefit at
/// these contention levels.
pub(crate) struct Shared {
    queue: RingQueue<Job>,
    /// The counter workers read to decide whether to sleep. Always `0`
    /// while paused — the hidden count lives in `phase` instead.
    pub(crate) queue_count: u32,
    phase: Phase,
    /// Number of workers spawned so far; only ever grows until a worker
    /// exits during `finish`.
    pub(crate) running: u32,
    /// Number of workers currently parked on the wake semaphore.
    pub(crate) waiting: u32,
    /// Once set, no new submissions are accepted and workers exit once the
    /// queue drains.
    pub(crate) done: bool,
    /// Snapshot of `running` taken the moment `done` was set, returned to
    /// every caller of `finish` (including ones that arrive after the
    /// first, satisfying idempotence without needing an out-parameter).
    spawned: u32,
    pub(crate) threads: Vec<JoinHandle<()>>,
}

impl Shared {
    /// The counter currently in effect: `queue_count` when running, the
    /// hidden pause counter otherwise.
    fn active_count(&self) -> u32 {
        match self.phase {
            Phase::Running => self.queue_count,
            Phase::Paused { hidden } => hidden,
        }
    }

    fn active_count_mut(&mut self) -> &mut u32 {
        match &mut self.phase {
            Phase::Running => &mut self.queue_count,
            Phase::Paused { hidden } => hidden,
        }
    }

    fn is_paused(&self) -> bool {
        matches!(self.phase, Phase::Paused { .. })
    }
}

/// Shared pool internals, held behind an `Arc` so worker threads and the
/// `Pool` handle can both reach it.
pub(crate) struct Inner {
    pub(crate) shared: Mutex<Shared>,
    /// Counts pending worker wakeups; posted by submit/resume/finish,
    /// consumed by a parked worker.
    pub(crate) wake: Semaphore,
    /// Counts free ring slots; consumed by producers, posted by workers.
    pub(crate) slot: Semaphore,
    threads_num: u32,
    queue_size: u32,
    block: bool,
}

/// A bounded, multi-producer / multi-consumer thread pool.
///
/// See the crate root for the full protocol description. Workers are
/// spawned lazily, only once work has actually been submitted, and joined
/// exactly once, by [`Pool::finish`].
pub struct Pool {
    inner: Arc<Inner>,
}

impl Pool {
    /// Creates a new pool.
    ///
    /// `threads_num == 0` resolves to the detected CPU count (which itself
    /// never reports less than `config::DEFAULT_THREADS_NUM` if the
    /// platform query fails — see [`count_cores`]). `queue_size == 0`
    /// resolves to `max(MIN_QUEUE_SIZE, threads_num * QUEUE_FACTOR)`,
    /// computed from the *already-resolved* thread count.
    ///
    /// `block` selects what `add_work` does when the queue is full: block
    /// until a slot frees up, or fail immediately.
    ///
    /// Returns `None` only if a worker's backing OS thread cannot be
    /// created at all during construction — this implementation never
    /// pre-spawns workers, so in practice `init` itself cannot fail and
    /// always returns `Some`; the `Option` return is kept so a future
    /// eager-spawn variant has somewhere to report failure.
    pub fn init(threads_num: u32, queue_size: u32, block: bool) -> Option<Pool> {
        debug_assert!(DEFAULT_THREADS_NUM > 0, "DEFAULT_THREADS_NUM must be positive");
        debug_assert!(QUEUE_FACTOR > 0, "QUEUE_FACTOR must be positive");
        debug_assert!(MIN_QUEUE_SIZE > 0, "MIN_QUEUE_SIZE must be positive");

        let threads_num = if threads_num > 0 {
            threads_num
        } else {
            count_cores()
        };

        let queue_size = if queue_size > 0 {
            queue_size
        } else {
            (threads_num * QUEUE_FACTOR).max(MIN_QUEUE_SIZE)
        };

        let shared = Shared {
            queue: RingQueue::with_capacity(queue_size as usize),
            queue_count: 0,
            phase: Phase::Running,
            running: 0,
            waiting: 0,
            done: false,
            spawned: 0,
            threads: Vec::with_capacity(threads_num as usize),
        };

        let inner = Arc::new(Inner {
            shared: Mutex::new(shared),
            wake: Semaphore::unbounded(0),
            slot: Semaphore::bounded(queue_size as usize, queue_size as usize),
            threads_num,
            queue_size,
            block,
        });

        log::debug!(
            "pool initialized: threads_num={threads_num} queue_size={queue_size} block={block}"
        );

        Some(Pool { inner })
    }

    /// Submits `job` for execution. Returns `true` if it was accepted.
    ///
    /// Rejected when: the pool is finishing; the queue is full and either
    /// non-blocking or paused; or a cold spawn failure occurred with no
    /// existing worker to fall back on.
    pub fn add_work(&self, job: Job) -> bool {
        let inner = &*self.inner;
        let mut guard = inner.shared.lock().unwrap();

        if guard.done {
            return false;
        }

        if guard.active_count() == inner.queue_size {
            let paused = guard.is_paused();
            if !inner.block || paused {
                log::trace!("add_work rejected: queue full, block={} paused={paused}", inner.block);
                return false;
            }

            // Blocking path: release the lock, wait for a free slot, then
            // re-check — another producer may have raced us and refilled
            // the queue in the meantime.
            loop {
                drop(guard);
                inner.slot.acquire();
                guard = inner.shared.lock().unwrap();

                if guard.active_count() == inner.queue_size {
                    inner.slot.release();
                    continue;
                }
                break;
            }
        } else {
            // Not full, so a free slot exists and this can't block.
            inner.slot.acquire();
        }

        let count = guard.active_count();
        guard.queue.enqueue(count, job);
        *guard.active_count_mut() = count + 1;

        let mut accepted = true;

        if guard.waiting > 0 {
            inner.wake.release();
        } else if guard.running < inner.threads_num {
            let worker_inner = Arc::clone(&self.inner);
            let id = guard.running;
            let spawned = std::thread::Builder::new()
                .name(format!("ctpool-worker-{id}"))
                .spawn(move || worker::run(worker_inner));

            match spawned {
                Ok(handle) => {
                    guard.threads.push(handle);
                    guard.running += 1;
                    log::debug!("spawned worker {id}, running={}", guard.running);
                }
                Err(err) if guard.running > 0 => {
                    // A worker already exists; it will eventually drain
                    // this slot, so the submission still counts as
                    // accepted.
                    log::debug!("worker spawn failed ({err}), existing workers will cover it");
                }
                Err(err) => {
                    // No worker has ever existed: nothing will ever pick
                    // this job up, so roll the reservation back.
                    log::debug!("worker spawn failed ({err}) with no running workers, rejecting");
                    let count = guard.active_count();
                    *guard.active_count_mut() = count - 1;
                    accepted = false;
                }
            }
        }
        // else: threads_num reached and no one waiting — an already-busy
        // worker will pick this job up on its next loop iteration.

        accepted
    }

    /// Hides the currently queued work from workers without discarding it.
    /// A no-op if already paused. O(1), idempotent.
    pub fn pause(&self) {
        let mut guard = self.inner.shared.lock().unwrap();
        if !guard.is_paused() {
            guard.phase = Phase::Paused {
                hidden: guard.queue_count,
            };
            guard.queue_count = 0;
            log::debug!("pool paused");
        }
    }

    /// Reveals work hidden by a prior [`Pool::pause`] and wakes every
    /// parked worker. A no-op if not paused.
    pub fn resume(&self) {
        let mut guard = self.inner.shared.lock().unwrap();
        if let Phase::Paused { hidden } = guard.phase {
            guard.queue_count = hidden;
            guard.phase = Phase::Running;
            for _ in 0..guard.waiting {
                self.inner.wake.release();
            }
            log::debug!("pool resumed, {} task(s) revealed", guard.queue_count);
        }
    }

    /// Discards all currently queued (but not yet started) work. Does not
    /// touch the slot semaphore — this is only ever meaningful immediately
    /// before [`Pool::finish`], which tears the semaphores down outright,
    /// so the discrepancy is never observed.
    pub fn clear_queue(&self) {
        let mut guard = self.inner.shared.lock().unwrap();
        // `queue_count` is already `0` while paused, so zeroing the active
        // counter covers both cases.
        *guard.active_count_mut() = 0;
        guard.queue = RingQueue::with_capacity(self.inner.queue_size as usize);
        log::debug!("queue cleared");
    }

    /// Terminal, idempotent, draining shutdown.
    ///
    /// Accepts no further submissions once called. Any queued work
    /// (including work hidden by a pause) is completed before this
    /// returns, unless [`Pool::clear_queue`] was called first. Returns the
    /// number of worker threads that were actually spawned over the
    /// pool's lifetime — calling `finish` again after the first call
    /// returns that same number without doing any further work, which is
    /// how this implementation expresses idempotence without an
    /// out-parameter that a second caller would otherwise leave
    /// unwritten.
    pub fn finish(&self) -> u32 {
        let (spawned, handles) = {
            let mut guard = self.inner.shared.lock().unwrap();

            if guard.done {
                return guard.spawned;
            }

            guard.done = true;
            guard.spawned = guard.running;

            if let Phase::Paused { hidden } = guard.phase {
                guard.queue_count = hidden;
                guard.phase = Phase::Running;
            }

            for _ in 0..guard.waiting {
                self.inner.wake.release();
            }

            log::debug!("pool finishing, joining {} worker(s)", guard.spawned);
            (guard.spawned, std::mem::take(&mut guard.threads))
        };

        for handle in handles {
            let _ = handle.join();
        }

        spawned
    }

    /// Current status: negative while paused, zero while idle (every
    /// spawned worker parked), positive otherwise. Advisory only — it may
    /// change between this read and the caller's next action.
    pub fn status(&self) -> i32 {
        let guard = self.inner.shared.lock().unwrap();
        if guard.is_paused() {
            return -1;
        }
        if guard.waiting == guard.running {
            0
        } else {
            1
        }
    }

    /// The maximum number of workers that may ever be spawned. Constant
    /// after `init`.
    pub fn threads_num(&self) -> u32 {
        self.inner.threads_num
    }

    /// The number of works currently enqueued in the active counter
    /// (hidden ones while paused).
    pub fn works_count(&self) -> u32 {
        self.inner.shared.lock().unwrap().active_count()
    }

    /// The fixed ring-buffer capacity. Constant after `init`.
    pub fn queue_size(&self) -> u32 {
        self.inner.queue_size
    }

    /// A percentage of current load: `round_half_up((running + count) *
    /// 100 / threads_num)`. No guarantee this is <= 100 — a pool with a
    /// deep backlog can legitimately read over 100%.
    pub fn load_factor(&self) -> u32 {
        let guard = self.inner.shared.lock().unwrap();
        let sum = (guard.running + guard.active_count()) as f64;
        let pct = (sum * 100.0 / self.inner.threads_num as f64) + 0.5;
        pct as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn init_defaults_threads_and_queue_size() {
        let pool = Pool::init(0, 0, false).expect("init should succeed");
        assert!(pool.threads_num() >= 1);
        assert!(pool.queue_size() >= MIN_QUEUE_SIZE);
        pool.finish();
    }

    #[test]
    fn pause_hides_then_resume_restores_works_count() {
        let pool = Pool::init(1, 4, false).expect("init should succeed");
        pool.pause();
        assert!(pool.add_work(Box::new(|| {})));
        assert!(pool.add_work(Box::new(|| {})));
        assert_eq!(pool.works_count(), 2);
        assert!(pool.status() < 0);

        pool.resume();
        assert_eq!(pool.works_count(), 2);
        pool.finish();
    }

    #[test]
    fn non_blocking_full_queue_rejects() {
        let pool = Pool::init(1, 2, false).expect("init should succeed");
        pool.pause();
        assert!(pool.add_work(Box::new(|| {})));
        assert!(pool.add_work(Box::new(|| {})));
        assert!(!pool.add_work(Box::new(|| {})));
        assert_eq!(pool.works_count(), 2);
        pool.finish();
    }

    #[test]
    fn clear_queue_drops_pending_work() {
        let pool = Pool::init(1, 4, false).expect("init should succeed");
        pool.pause();
        pool.add_work(Box::new(|| {}));
        pool.add_work(Box::new(|| {}));
        assert_eq!(pool.works_count(), 2);
        pool.clear_queue();
        assert_eq!(pool.works_count(), 0);
        pool.finish();
    }

    #[test]
    fn finish_is_idempotent_and_drains_queued_work() {
        let pool = Pool::init(2, 8, true).expect("init should succeed");
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let c = Arc::clone(&counter);
            pool.add_work(Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }));
        }

        let spawned_first = pool.finish();
        let spawned_second = pool.finish();
        assert_eq!(spawned_first, spawned_second);
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn submit_after_finish_is_rejected() {
        let pool = Pool::init(1, 4, false).expect("init should succeed");
        pool.finish();
        assert!(!pool.add_work(Box::new(|| {})));
    }

    #[test]
    fn load_factor_is_zero_when_idle() {
        let pool = Pool::init(4, 16, false).expect("init should succeed");
        assert_eq!(pool.load_factor(), 0);
        pool.finish();
    }
}
