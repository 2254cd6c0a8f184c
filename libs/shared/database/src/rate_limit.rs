use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60);

/// Keys tracked before idle ones are swept.
const SWEEP_THRESHOLD: usize = 4096;

/// Sliding one-minute window of request instants per key (client IP).
pub struct RateLimiter {
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
    per_minute: usize,
}

impl RateLimiter {
    pub fn per_minute(limit: u64) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            per_minute: usize::try_from(limit).unwrap_or(usize::MAX).max(1),
        }
    }

    /// Records a request for `key`. Returns `Err(retry_after_secs)` once the
    /// key has used up its minute.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), u64> {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        if windows.len() >= SWEEP_THRESHOLD {
            windows.retain(|_, hits| hits.back().is_some_and(|last| now.duration_since(*last) < WINDOW));
        }

        let hits = windows.entry(key.to_string()).or_default();
        while hits.front().is_some_and(|first| now.duration_since(*first) >= WINDOW) {
            hits.pop_front();
        }

        if hits.len() >= self.per_minute {
            let retry_after = hits
                .front()
                .map(|first| WINDOW.saturating_sub(now.duration_since(*first)))
                .unwrap_or(WINDOW);
            // Round up so clients never retry a moment too early.
            return Err(retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0));
        }

        hits.push_back(now);
        Ok(())
    }
}
