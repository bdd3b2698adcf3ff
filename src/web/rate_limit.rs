//! Process-global rolling-window rate limiting.
//!
//! Every request shares a single quota; the key is the process, not the
//! caller. Two ceilings apply at once: one over a rolling minute and one
//! over a rolling day. Swapping the constant key for a per-client one would
//! only mean keying the state by caller; the window accounting would stay
//! the same.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Shared rolling-window limiter. Thread-safe; cheaply shared via `Arc`.
pub struct RateLimiter {
    state: Mutex<VecDeque<Instant>>,
    per_minute: usize,
    per_day: usize,
    minute: Duration,
    day: Duration,
}

impl RateLimiter {
    pub fn new(per_minute: usize, per_day: usize) -> Self {
        Self::with_windows(
            per_minute,
            per_day,
            Duration::from_secs(60),
            Duration::from_secs(24 * 60 * 60),
        )
    }

    /// Custom window durations, for tests that cannot wait out real windows.
    pub fn with_windows(
        per_minute: usize,
        per_day: usize,
        minute: Duration,
        day: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(VecDeque::new()),
            per_minute,
            per_day,
            minute,
            day,
        }
    }

    /// Record one request if the quota allows it.
    ///
    /// Returns `Ok(())` when admitted, or `Err(retry_after_secs)` when
    /// either ceiling is hit.
    pub fn check(&self) -> Result<(), u64> {
        let now = Instant::now();
        let mut timestamps = self.state.lock().unwrap_or_else(|p| p.into_inner());

        // Entries older than the day window can never count again.
        while let Some(front) = timestamps.front() {
            if now.duration_since(*front) >= self.day {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.per_day {
            let oldest = timestamps[timestamps.len() - self.per_day];
            return Err(retry_after(now, oldest, self.day));
        }

        let in_minute = timestamps
            .iter()
            .rev()
            .take_while(|t| now.duration_since(**t) < self.minute)
            .count();
        if in_minute >= self.per_minute {
            let oldest_in_minute = timestamps[timestamps.len() - in_minute];
            return Err(retry_after(now, oldest_in_minute, self.minute));
        }

        timestamps.push_back(now);
        Ok(())
    }
}

fn retry_after(now: Instant, blocking: Instant, window: Duration) -> u64 {
    window
        .saturating_sub(now.duration_since(blocking))
        .as_secs()
        .max(1)
}
