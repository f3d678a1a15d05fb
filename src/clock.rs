//! Time predicates shared by the engine's housekeeping paths.
//!
//! The engine never reads the clock on its own. Every entry point has an
//! `..._at(now)` variant taking an explicit [`Instant`], and the plain
//! variants delegate with `Instant::now()`. Deterministic tests drive the
//! `_at` variants with a synthetic timeline.

use std::time::{Duration, Instant};

/// Whether `timestamp` lies strictly more than `age` before `now`.
///
/// Saturates when `timestamp` is in the future relative to `now`, so a
/// stale status snapshot can never trip a timeout early.
#[must_use]
pub(crate) fn older_than(timestamp: Instant, age: Duration, now: Instant) -> bool {
    now.saturating_duration_since(timestamp) > age
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_older_comparison() {
        let base = Instant::now();
        let age = Duration::from_millis(100);

        assert!(!older_than(base, age, base));
        assert!(!older_than(base, age, base + age));
        assert!(older_than(base, age, base + age + Duration::from_millis(1)));
    }

    #[test]
    fn future_timestamps_never_read_as_old() {
        let base = Instant::now();
        assert!(!older_than(
            base + Duration::from_secs(5),
            Duration::ZERO,
            base
        ));
    }
}
