use std::thread;
use std::time::Duration;

use crate::error::{Result, StoreError};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Linear backoff around a store operation. Only transient errors
/// (busy/locked database) are retried; the wait before retry `n` (0-based)
/// is `base_delay * (n + 1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_add(1))
    }

    pub fn run<T>(&self, op: impl FnMut() -> Result<T>) -> Result<T> {
        self.run_with_sleep(op, thread::sleep)
    }

    /// Same as [`run`](Self::run) with the wait supplied by the caller.
    pub fn run_with_sleep<T>(
        &self,
        mut op: impl FnMut() -> Result<T>,
        mut sleep: impl FnMut(Duration),
    ) -> Result<T> {
        let mut attempt = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        "store operation failed (attempt {}): {e}. Retrying in {delay:?}",
                        attempt + 1
                    );
                    sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(retry_exhausted(e, attempt)),
            }
        }
    }
}

fn retry_exhausted(e: StoreError, attempt: u32) -> StoreError {
    if attempt > 0 {
        tracing::warn!("store operation gave up after {} attempt(s): {e}", attempt + 1);
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn busy() -> StoreError {
        StoreError::Sqlite(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        ))
    }

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_linear_delays() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(300));
    }

    #[test]
    fn test_recovers_after_transient_failures() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let calls = Cell::new(0);
        let mut waits = Vec::new();

        let value = policy
            .run_with_sleep(
                || {
                    calls.set(calls.get() + 1);
                    if calls.get() < 3 { Err(busy()) } else { Ok(42) }
                },
                |d| waits.push(d),
            )
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.get(), 3);
        assert_eq!(waits, vec![Duration::from_millis(10), Duration::from_millis(20)]);
    }

    #[test]
    fn test_gives_up_after_max_retries() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let calls = Cell::new(0);
        let result: Result<()> = policy.run_with_sleep(
            || {
                calls.set(calls.get() + 1);
                Err(busy())
            },
            |_| {},
        );
        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_permanent_error_not_retried() {
        let policy = RetryPolicy::default();
        let calls = Cell::new(0);
        let result: Result<()> = policy.run_with_sleep(
            || {
                calls.set(calls.get() + 1);
                Err(StoreError::NotFound("reminder x".to_string()))
            },
            |_| panic!("should not sleep"),
        );
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert_eq!(calls.get(), 1);
    }
}
