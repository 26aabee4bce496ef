//! Connection establishment with bounded retry.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default number of connection attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default pause between attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(500);

// ============================================================================
// RetryPolicy
// ============================================================================

/// How often and how patiently to retry a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero counts as one.
    pub max_attempts: u32,
    /// Pause before every attempt after the first.
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy.
    #[inline]
    #[must_use]
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Returns the effective attempt budget.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

// ============================================================================
// connect_with_retry
// ============================================================================

/// Runs `attempt` until it succeeds or the policy is exhausted.
///
/// `attempt` receives the 1-based attempt number. Attempt 1 runs
/// immediately; each later attempt sleeps `policy.interval` first. Errors
/// that are not [recoverable](Error::is_recoverable) end the loop at once.
///
/// # Errors
///
/// Returns [`Error::ConnectionExhausted`] after the last failed attempt.
pub async fn connect_with_retry<T, F, Fut>(policy: &RetryPolicy, mut attempt: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.attempts();
    let mut last_error = None;

    for n in 1..=attempts {
        if n > 1 {
            tokio::time::sleep(policy.interval).await;
        }

        match attempt(n).await {
            Ok(value) => {
                debug!(attempt = n, "Connected");
                return Ok(value);
            }
            Err(e) if !e.is_recoverable() => {
                return Err(e.during("connect"));
            }
            Err(e) => {
                warn!(attempt = n, max_attempts = attempts, error = %e, "connect failed");
                last_error = Some(e);
            }
        }
    }

    let message = last_error.map_or_else(|| "no attempt made".to_string(), |e| e.to_string());
    Err(Error::connection_exhausted(attempts, message))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_has_no_delay() {
        let start = Instant::now();
        let value = connect_with_retry(&RetryPolicy::default(), |_| async { Ok(7) })
            .await
            .expect("connect");

        assert_eq!(value, 7);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let counter = Arc::clone(&calls);
        let attempt = connect_with_retry(&RetryPolicy::default(), move |n| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n <= 3 {
                    Err(Error::connection("connection refused"))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .expect("connect");

        assert_eq!(attempt, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), DEFAULT_RETRY_INTERVAL * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let err = connect_with_retry(&policy, |_| async {
            Err::<(), _>(Error::connection("connection refused"))
        })
        .await
        .unwrap_err();

        match err {
            Error::ConnectionExhausted { attempts, message } => {
                assert_eq!(attempts, 3);
                assert!(message.contains("connection refused"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_means_one() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        let result = connect_with_retry(&policy, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Error::connection("down")) }
        })
        .await;

        assert!(matches!(
            result,
            Err(Error::ConnectionExhausted { attempts: 1, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrecoverable_error_stops_early() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = connect_with_retry(&RetryPolicy::default(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Error::config("bad endpoint")) }
        })
        .await;

        assert!(matches!(result, Err(Error::Failed { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
