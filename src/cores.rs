//! CPU-count detection, used by [`crate::pool::Pool::init`] when the caller
//! passes `threads_num == 0`.
//!
//! `std::thread::available_parallelism` already queries the OS portably
//! across platforms, so there's no need to hand-roll the `sysconf`/
//! `sysctl`/Windows dispatch a lower-level probe would otherwise require.

use crate::config::DEFAULT_THREADS_NUM;

/// Returns the number of logical CPU cores available on the system.
///
/// Guaranteed to return a value >= 1: falls back to
/// [`DEFAULT_THREADS_NUM`] if the platform query fails.
pub fn count_cores() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(DEFAULT_THREADS_NUM)
}
