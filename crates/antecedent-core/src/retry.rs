//! Bounded exponential backoff around fallible async operations.
//!
//! [`with_backoff`] knows nothing about backends: the caller supplies the
//! operation, a classifier deciding which errors are worth retrying and the
//! schedule. [`classify_fetch_error`] is the classifier used for object
//! reads during verification.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use antecedent_backend::BackendError;

/// Backoff schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Sleep before the second attempt.
    pub initial_interval: Duration,
    /// Multiplier applied to the sleep after every attempt.
    pub factor: f64,
    /// Random extra sleep, as a fraction of the scheduled sleep.
    pub jitter: f64,
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Give up instead of sleeping past this much total time.
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    /// 10ms, 50ms, 250ms between four attempts, with 10% jitter.
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(10),
            factor: 5.0,
            jitter: 0.1,
            max_attempts: 4,
            max_elapsed: None,
        }
    }
}

impl RetryPolicy {
    /// A policy that retries without sleeping. Meant for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            initial_interval: Duration::ZERO,
            factor: 1.0,
            jitter: 0.0,
            max_attempts,
            max_elapsed: None,
        }
    }

    #[must_use]
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    #[must_use]
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = Some(max_elapsed);
        self
    }

    /// Scheduled sleeps between attempts, before jitter.
    pub fn intervals(&self) -> impl Iterator<Item = Duration> + '_ {
        let mut next = self.initial_interval;
        (1..self.max_attempts.max(1)).map(move |_| {
            let current = next;
            next = next.mul_f64(self.factor.max(1.0));
            current
        })
    }

    /// Longest scheduled sleep. Suggested delays are capped at this.
    pub fn max_interval(&self) -> Duration {
        self.intervals().last().unwrap_or(self.initial_interval)
    }

    fn jittered(&self, interval: Duration) -> Duration {
        if self.jitter <= 0.0 || interval.is_zero() {
            return interval;
        }
        interval + interval.mul_f64(self.jitter * rand::random::<f64>())
    }
}

/// How a failed attempt should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Worth another attempt, optionally no sooner than the given delay.
    Transient { suggested_delay: Option<Duration> },
    /// Give up immediately.
    Terminal,
}

/// Classifies failures of object reads.
///
/// Connection resets, internal errors, timeouts, throttling and anything
/// carrying a suggested retry delay are transient. Everything else,
/// including not-found, is terminal.
pub fn classify_fetch_error(err: &BackendError) -> Classification {
    let suggested_delay = err.suggests_client_delay();
    if err.is_connection_reset()
        || err.is_internal_error()
        || err.is_timeout()
        || err.is_too_many_requests()
        || suggested_delay.is_some()
    {
        Classification::Transient {
            suggested_delay: suggested_delay.filter(|d| !d.is_zero()),
        }
    } else {
        Classification::Terminal
    }
}

/// Returns `true` if [`classify_fetch_error`] would retry `err`.
pub fn is_transient(err: &BackendError) -> bool {
    matches!(classify_fetch_error(err), Classification::Transient { .. })
}

/// Runs `operation` until it succeeds, fails terminally or the schedule
/// runs out.
///
/// Exhausting the schedule returns the last error observed. A suggested
/// delay from the classifier replaces the scheduled sleep when it is longer,
/// but never exceeds [`RetryPolicy::max_interval`].
pub async fn with_backoff<T, E, Op, Fut, C>(
    policy: &RetryPolicy,
    classify: C,
    mut operation: Op,
) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> Classification,
    E: fmt::Display,
{
    let started = Instant::now();
    let mut intervals = policy.intervals();
    let mut attempt: u32 = 1;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let suggested_delay = match classify(&err) {
            Classification::Terminal => return Err(err),
            Classification::Transient { suggested_delay } => suggested_delay,
        };

        let Some(interval) = intervals.next() else {
            tracing::debug!(attempts = attempt, error = %err, "Retry attempts exhausted");
            return Err(err);
        };
        let mut sleep_for = policy.jittered(interval);
        if let Some(delay) = suggested_delay {
            sleep_for = sleep_for.max(delay.min(policy.max_interval()));
        }
        if let Some(max_elapsed) = policy.max_elapsed
            && started.elapsed() + sleep_for > max_elapsed
        {
            tracing::debug!(attempts = attempt, error = %err, "Retry time budget exhausted");
            return Err(err);
        }

        tracing::debug!(
            attempt,
            delay_ms = sleep_for.as_millis() as u64,
            error = %err,
            "Transient failure, retrying"
        );
        tokio::time::sleep(sleep_for).await;
        attempt += 1;
    }
}
