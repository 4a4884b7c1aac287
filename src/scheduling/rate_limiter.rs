//! Per-minute token bucket (§4.5 "per-source rate limit"). Hand-rolled: the
//! corpus doesn't carry a rate-limiting crate, and the policy is simple
//! enough that a dependency would be heavier than the code it replaces.

use std::sync::Mutex;
use std::time::{Duration, Instant};

struct State {
    tokens: f64,
    last_refill: Instant,
}

/// A token bucket that refills continuously at `capacity` tokens per
/// minute. `try_acquire` is non-blocking; callers that need to wait use
/// `acquire`.
pub struct RateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<State>,
}

impl RateLimiter {
    pub fn per_minute(capacity: u32) -> Self {
        let capacity = capacity.max(1) as f64;
        Self {
            capacity,
            refill_per_sec: capacity / 60.0,
            state: Mutex::new(State {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(&self, state: &mut State) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;
    }

    /// Attempts to take one token without blocking.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().expect("rate limiter mutex poisoned");
        self.refill(&mut state);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Waits until a token is available, then takes it.
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }
}
