//! Bounded retry for a fallible unit of work.
//!
//! The delay schedule is a pure function of the retry number ([`RetryPolicy::delay_for`]),
//! with no jitter, so the same policy always waits the same amounts. Execution goes
//! through backon; the whole retry races the cancellation token, so cancelling
//! interrupts an attempt or a pending backoff sleep alike.

use backon::Retryable;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed,
    Exponential,
}

impl Backoff {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "fixed" => Some(Self::Fixed),
            "exponential" => Some(Self::Exponential),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1 is the wait after the first failure).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let delay = match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential => {
                let factor = 2u32.saturating_pow(retry.saturating_sub(1));
                self.base_delay.saturating_mul(factor)
            }
        };
        delay.min(self.max_delay)
    }

    fn schedule(&self) -> Schedule {
        Schedule {
            policy: *self,
            retry: 0,
        }
    }
}

/// Backoff iterator handed to backon: one delay per remaining attempt.
#[derive(Debug, Clone)]
struct Schedule {
    policy: RetryPolicy,
    retry: u32,
}

impl Iterator for Schedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.retry + 1 >= self.policy.max_attempts.max(1) {
            return None;
        }
        self.retry += 1;
        Some(self.policy.delay_for(self.retry))
    }
}

#[derive(Error, Debug)]
pub enum RetryError<E> {
    #[error("cancelled")]
    Cancelled,

    #[error("gave up after {attempts} attempt(s): {source}")]
    Exhausted { attempts: u32, source: E },
}

impl<E> RetryError<E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, Clone)]
pub struct RetryableTask {
    policy: RetryPolicy,
}

impl RetryableTask {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Retry every error until attempts run out.
    pub async fn run<T, E, F, Fut>(
        &self,
        token: &CancellationToken,
        operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_when(token, operation, |_| true).await
    }

    /// Retry only errors accepted by `should_retry`; others are surfaced at once.
    pub async fn run_when<T, E, F, Fut, P>(
        &self,
        token: &CancellationToken,
        mut operation: F,
        should_retry: P,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: FnMut(&E) -> bool,
    {
        if token.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        let attempts = AtomicU32::new(0);
        let attempt = || {
            attempts.fetch_add(1, Ordering::Relaxed);
            operation()
        };

        let retrying = attempt
            .retry(self.policy.schedule())
            .sleep(tokio::time::sleep)
            .when(should_retry)
            .notify(|err: &E, delay: Duration| {
                warn!("Attempt failed: {}; retrying in {:?}", err, delay);
            });

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(RetryError::Cancelled),
            result = retrying => result.map_err(|source| RetryError::Exhausted {
                attempts: attempts.load(Ordering::Relaxed),
                source,
            }),
        }
    }
}
