// config.rs — Compile-time configuration constants.
//
// Plain `const`s rather than a config file or environment variables: there
// is no runtime-configurable surface to this pool beyond the three
// constructor parameters, so anything else belongs here, checked once at
// the use site in `pool::Pool::init` via `debug_assert!` since these are
// ordinary constants a downstream fork could edit to something invalid.

/// Worker count used by [`crate::pool::Pool::init`] when the caller passes
/// `threads_num == 0` and the CPU probe itself cannot be trusted (it never
/// returns zero, so this is really a belt-and-braces floor).
pub const DEFAULT_THREADS_NUM: u32 = 4;

/// Multiplier applied to the resolved thread count when the caller passes
/// `queue_size == 0`: `queue_size = threads_num * QUEUE_FACTOR`, then
/// clamped up to [`MIN_QUEUE_SIZE`].
pub const QUEUE_FACTOR: u32 = 8;

/// Minimum queue size used when the caller passes `queue_size == 0`.
pub const MIN_QUEUE_SIZE: u32 = 256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tunables_are_positive() {
        assert!(DEFAULT_THREADS_NUM > 0);
        assert!(QUEUE_FACTOR > 0);
        assert!(MIN_QUEUE_SIZE > 0);
    }
}
