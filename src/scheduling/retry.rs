//! Exponential backoff wrapper (§4.5, §4.8): 1s initial interval doubling up
//! to a 16s cap, 5 attempts total. Shared by the external data clients and
//! the oracle keeper's per-iteration failure handling.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use std::future::Future;
use std::time::Duration;

/// Retries `op` up to `max_attempts` times, sleeping with exponential
/// backoff (1s doubling to a 16s cap) between attempts. Returns the last
/// error once attempts are exhausted.
pub async fn with_backoff<T, E, F, Fut>(max_attempts: u32, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut backoff = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_secs(1))
        .with_max_interval(Duration::from_secs(16))
        .with_multiplier(2.0)
        .with_max_elapsed_time(None)
        .build();

    let attempts = max_attempts.max(1);
    let mut last_err = None;
    for attempt in 0..attempts {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                last_err = Some(e);
                if attempt + 1 < attempts {
                    let delay = backoff.next_backoff().unwrap_or(Duration::from_secs(16));
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    Err(last_err.expect("at least one attempt runs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry_when_first_attempt_is_ok() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &'static str> = with_backoff(3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(42u32) }
        })
        .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_all_attempts_before_returning_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &'static str> = with_backoff(2, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("still failing") }
        })
        .await;
        assert_eq!(result, Err("still failing"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
