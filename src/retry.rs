//! Jittered-linear backoff shared by the Work Selector and the Updater.
//!
//! This is one of two distinct backoff policies in the engine; the
//! Scheduler's idle backoff (unjittered exponential) lives in
//! `scheduler.rs` and intentionally does not share code with this module.

use rand::Rng;
use std::time::Duration;

/// Maximum number of attempts for a retriable DB operation.
pub const MAX_ATTEMPTS: u32 = 10;

/// Delay before the next attempt: `0.5 * attempt + uniform(0, 0.3)` seconds.
pub fn jittered_linear_delay(attempt: u32) -> Duration {
    let base = 0.5_f64 * attempt as f64;
    let jitter = rand::thread_rng().gen_range(0.0..0.3_f64);
    Duration::from_secs_f64(base + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_grows_with_attempt() {
        // jitter alone can't bridge a 0.5s gap between consecutive attempts
        let d1 = jittered_linear_delay(1);
        let d5 = jittered_linear_delay(5);
        assert!(d5 > d1);
    }

    #[test]
    fn test_delay_bounds_for_first_attempt() {
        let d = jittered_linear_delay(1);
        assert!(d.as_secs_f64() >= 0.5);
        assert!(d.as_secs_f64() < 0.9);
    }
}
