//! Process-wide push-time and push-count counters.
//!
//! The source keeps these as file-scope mutable doubles; spec §9 flags
//! that as a redesign target. Atomics give the same "one number shared by
//! every species" shape without a lock, and compose cleanly with the
//! pusher's per-call timing (spec §4.4's "timing" step).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static TOTAL_PUSHES: AtomicU64 = AtomicU64::new(0);
static TOTAL_NANOS: AtomicU64 = AtomicU64::new(0);

/// Record that `count` particles were pushed in `elapsed`. Called once per
/// `advance` by every species; safe to call concurrently.
pub fn record(count: u64, elapsed: Duration) {
    TOTAL_PUSHES.fetch_add(count, Ordering::Relaxed);
    TOTAL_NANOS.fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
}

/// Total particle-pushes recorded across every species since process start.
#[must_use]
pub fn npush() -> u64 {
    TOTAL_PUSHES.load(Ordering::Relaxed)
}

/// Total time spent pushing particles, across every species.
#[must_use]
pub fn time() -> Duration {
    Duration::from_nanos(TOTAL_NANOS.load(Ordering::Relaxed))
}

/// Average seconds per particle push, or `None` if nothing has been pushed
/// yet (spec §6 lists this as "seconds/push or -1"; the sentinel becomes an
/// absent value here).
#[must_use]
pub fn perf() -> Option<f64> {
    let pushes = npush();
    if pushes == 0 {
        return None;
    }
    Some(time().as_secs_f64() / pushes as f64)
}

/// Reset the counters to zero. Exists for tests, which would otherwise
/// observe state left over by other tests in the same process.
#[cfg(test)]
pub(crate) fn reset() {
    TOTAL_PUSHES.store(0, Ordering::Relaxed);
    TOTAL_NANOS.store(0, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    // The counters are process-wide statics, so both behaviors are checked
    // in one test to avoid interference from `cargo test`'s default
    // parallel execution.
    #[test]
    fn perf_is_none_until_pushes_are_recorded_then_averages_across_calls() {
        reset();
        assert_eq!(perf(), None);

        record(100, Duration::from_millis(10));
        record(100, Duration::from_millis(10));

        assert_eq!(npush(), 200);
        let p = perf().unwrap();
        assert!((p - 0.0001).abs() < 1e-9);
    }
}
