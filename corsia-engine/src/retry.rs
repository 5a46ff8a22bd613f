use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::warn;

/// Bounded retry with exponential backoff.
///
/// Attempt 1 runs immediately; attempt k (k >= 2) is preceded by a delay of
/// `base_delay * multiplier^(k-2)`. With the defaults this bounds a fully
/// contended call at 3 attempts and ~300ms of cumulative backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay inserted before the given 1-indexed attempt.
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        self.base_delay * self.multiplier.pow(attempt - 2)
    }
}

/// Why a retried operation gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The operation failed with an error the predicate did not mark
    /// transient. Returned immediately, no retry.
    Terminal(E),
    /// Every allowed attempt failed with a transient error.
    Exhausted { last: E, attempts: u32 },
    /// Continuing would have overrun the caller's deadline. Carries the last
    /// transient error when at least one attempt ran.
    DeadlineExceeded { last: Option<E> },
}

/// Run `operation` until it succeeds, fails terminally, or the policy is
/// exhausted. Only errors for which `is_transient` returns true are retried.
///
/// When `deadline` is set, the helper aborts before an attempt or before a
/// backoff sleep that would overrun it, rather than running past the
/// caller's deadline.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    deadline: Option<Instant>,
    mut operation: F,
    is_transient: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 1u32;
    let mut last_transient: Option<E> = None;

    loop {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Err(RetryError::DeadlineExceeded {
                    last: last_transient,
                });
            }
        }

        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_transient(&err) => return Err(RetryError::Terminal(err)),
            Err(err) => {
                if attempt >= policy.max_attempts {
                    return Err(RetryError::Exhausted {
                        last: err,
                        attempts: attempt,
                    });
                }

                attempt += 1;
                let delay = policy.delay_before_attempt(attempt);

                if let Some(deadline) = deadline {
                    if Instant::now() + delay >= deadline {
                        return Err(RetryError::DeadlineExceeded { last: Some(err) });
                    }
                }

                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient failure, backing off before retry"
                );
                last_transient = Some(err);
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_default_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before_attempt(1), Duration::ZERO);
        assert_eq!(policy.delay_before_attempt(2), Duration::from_millis(100));
        assert_eq!(policy.delay_before_attempt(3), Duration::from_millis(200));
        assert_eq!(policy.delay_before_attempt(4), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let result = retry_with_backoff(
            &RetryPolicy::default(),
            None,
            || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(42)
                }
            },
            |_| true,
        )
        .await;

        assert!(matches!(result, Ok(42)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_exhaust_after_max_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let started = Instant::now();

        let result = retry_with_backoff(
            &RetryPolicy::default(),
            None,
            || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("conflict".to_string())
                }
            },
            |_| true,
        )
        .await;

        assert!(matches!(
            result,
            Err(RetryError::Exhausted { attempts: 3, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 100ms before attempt 2, 200ms before attempt 3.
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_terminal_error_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let result = retry_with_backoff(
            &RetryPolicy::default(),
            None,
            || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("permanent".to_string())
                }
            },
            |err| err.contains("transient"),
        )
        .await;

        assert!(matches!(result, Err(RetryError::Terminal(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_stops_backoff_early() {
        let policy = RetryPolicy::default();
        let deadline = Instant::now() + Duration::from_millis(150);

        let result = retry_with_backoff(
            &policy,
            Some(deadline),
            || async { Err::<(), _>("conflict".to_string()) },
            |_| true,
        )
        .await;

        // Attempt 1 at t=0, backoff to t=100, attempt 2 fails, and the next
        // 200ms backoff would land past the deadline.
        assert!(matches!(
            result,
            Err(RetryError::DeadlineExceeded { last: Some(_) })
        ));
        // Aborted before sleeping into the deadline, not after overrunning it.
        assert!(Instant::now() < deadline);
    }
}
