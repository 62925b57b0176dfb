//! Bounded exponential backoff for calls against remote services.
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Errors that can tell whether trying again might help.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Retry policy: `attempts` tries in total, sleeping `base_delay * 2^(n-1)`
/// after the n-th failed try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl Backoff {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1_u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails permanently, or the attempt budget
    /// is spent. The last error is returned.
    pub async fn retry<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < attempts => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        what,
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        %err,
                        "transient failure; retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Flaky(bool);

    impl Display for Flaky {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "flaky(transient={})", self.0)
        }
    }

    impl Transient for Flaky {
        fn is_transient(&self) -> bool {
            self.0
        }
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let b = Backoff::new(3, Duration::from_millis(500));
        assert_eq!(b.delay_after(1), Duration::from_millis(500));
        assert_eq!(b.delay_after(2), Duration::from_millis(1000));
        assert_eq!(b.delay_after(3), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let calls = &AtomicU32::new(0);
        let b = Backoff::new(3, Duration::ZERO);
        let res: Result<(), Flaky> = b
            .retry("search", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Flaky(true))
            })
            .await;
        assert!(res.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let b = Backoff::new(3, Duration::ZERO);
        let res: Result<(), Flaky> = b
            .retry("fetch", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Flaky(false))
            })
            .await;
        assert!(res.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failure() {
        let calls = &AtomicU32::new(0);
        let b = Backoff::new(3, Duration::ZERO);
        let res = b
            .retry("search", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(Flaky(true))
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(res.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
