//! A bounded, multi-producer / multi-consumer thread pool backed by a
//! fixed-capacity ring buffer.
//!
//! Workers are spawned lazily, on first need, up to a configured ceiling.
//! Submission is coordinated by a single mutex plus two counting
//! semaphores: one tracks free queue slots, the other wakes parked workers.
//! The pool can be paused (queued work is hidden from workers but not
//! dropped), resumed, cleared, and finally drained to completion by
//! [`Pool::finish`].
//!
//! ```
//! use ctpool::Pool;
//!
//! let pool = Pool::init(4, 64, true).expect("init");
//! assert!(pool.add_work(Box::new(|| {
//!     // ... do work ...
//! })));
//! pool.finish();
//! ```

pub mod config;
pub mod cores;
pub mod pool;
pub mod queue;
pub mod sem;
mod worker;

pub use pool::{Job, Pool};
