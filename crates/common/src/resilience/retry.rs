//! Exponential backoff with jitter for classified, fallible async operations.
//!
//! A [`RetryPolicy`] is an immutable value validated once by its builder and
//! reusable across any number of calls. Every call gets its own attempt
//! counter. Failures are inspected through [`ErrorClassification`]: only the
//! [`FailureKind`]s in the policy's retryable set are retried, everything else
//! ends the loop immediately.
//!
//! The delay before attempt `n + 1` is
//! `base_delay * backoff_factor^(n - 1) + U[0, jitter)`.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::error::{ErrorClassification, FailureKind};

/// Terminal failure of a retried operation.
///
/// Both variants carry the number of attempts that were made and the last
/// error the operation produced.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable condition.
    #[error("retry attempts exhausted after {attempts} tries: {last_error}")]
    Exhausted { attempts: u32, last_error: E },

    /// The operation failed with a condition outside the retryable set.
    #[error("operation failed with non-retryable error after {attempts} attempt(s): {source}")]
    NonRetryable { attempts: u32, source: E },
}

impl<E> RetryError<E> {
    /// Number of attempts performed before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::NonRetryable { attempts, .. } => *attempts,
        }
    }

    /// The last error seen.
    pub fn last_error(&self) -> &E {
        match self {
            Self::Exhausted { last_error, .. } => last_error,
            Self::NonRetryable { source, .. } => source,
        }
    }

    /// Drop the retry bookkeeping and return the last error.
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last_error, .. } => last_error,
            Self::NonRetryable { source, .. } => source,
        }
    }

    /// Whether the loop stopped because it ran out of attempts.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

impl<E: ErrorClassification> ErrorClassification for RetryError<E> {
    fn failure_kind(&self) -> FailureKind {
        self.last_error().failure_kind()
    }
}

/// Result type for retried operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Rejected policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("backoff_factor must be a finite number greater than 1 (got {0})")]
    InvalidBackoffFactor(String),

    #[error("{0} failures can never be plain-retried")]
    UnretryableCondition(FailureKind),

    #[error("retryable_conditions must not be empty")]
    NoConditions,
}

/// Outcome of a single attempt within one retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    RetryableFailure,
    FatalFailure,
}

/// Transient record of one attempt. Only lives inside a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationAttempt {
    pub attempt_number: u32,
    pub outcome: AttemptOutcome,
    /// Delay slept before the next attempt; `None` when no attempt follows.
    pub delay_before_next: Option<Duration>,
}

/// Result of [`RetryPolicy::execute_with_history`] with per-attempt records.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: RetryResult<T, E>,
    pub history: Vec<OperationAttempt>,
    pub total_delay: Duration,
    pub first_attempt_time: Instant,
}

impl<T, E> RetryOutcome<T, E> {
    /// Consume the outcome and return only the result.
    pub fn into_result(self) -> RetryResult<T, E> {
        self.result
    }

    /// Number of attempts made.
    pub fn attempts(&self) -> u32 {
        self.history.len() as u32
    }

    /// Total elapsed time from first attempt to completion.
    pub fn total_elapsed(&self) -> Duration {
        self.first_attempt_time.elapsed()
    }
}

/// Immutable retry policy.
///
/// ```rust
/// use std::time::Duration;
///
/// use altoro_common::resilience::RetryPolicy;
///
/// let policy = RetryPolicy::builder()
///     .max_attempts(4)
///     .base_delay(Duration::from_millis(500))
///     .backoff_factor(2.0)
///     .jitter(Duration::from_millis(100))
///     .build()
///     .expect("valid policy");
///
/// assert_eq!(policy.max_attempts(), 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    backoff_factor: f64,
    jitter: Duration,
    retryable: BTreeSet<FailureKind>,
}

impl RetryPolicy {
    /// Start building a policy from the defaults (3 attempts, 1s base,
    /// factor 2, no jitter, retry transient failures).
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::new()
    }

    /// A policy that runs the operation exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            backoff_factor: 2.0,
            jitter: Duration::ZERO,
            retryable: BTreeSet::from([FailureKind::Transient]),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    /// Upper (exclusive) bound of the random jitter added to each delay.
    pub fn jitter_range(&self) -> Duration {
        self.jitter
    }

    /// Whether the policy retries failures of `kind`.
    pub fn retries(&self, kind: FailureKind) -> bool {
        self.retryable.contains(&kind)
    }

    /// Deterministic part of the delay after failed attempt `attempt`
    /// (1-based): `base_delay * backoff_factor^(attempt - 1)`.
    ///
    /// Saturates at `Duration::MAX` rather than overflowing.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Full delay after failed attempt `attempt`, jitter drawn from `rng`.
    ///
    /// The result always lies in
    /// `[backoff_for_attempt(attempt), backoff_for_attempt(attempt) + jitter)`
    /// (or equals the backoff when jitter is zero).
    pub fn delay_for_attempt<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let backoff = self.backoff_for_attempt(attempt);
        if self.jitter.is_zero() {
            return backoff;
        }
        let jitter_nanos = u64::try_from(self.jitter.as_nanos()).unwrap_or(u64::MAX);
        let sample = Duration::from_nanos(rng.gen_range(0..jitter_nanos));
        backoff.saturating_add(sample)
    }

    /// Run `operation` under this policy.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> RetryResult<T, E>
    where
        E: ErrorClassification + fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_history(operation).await.into_result()
    }

    /// Run `operation` under this policy and keep the per-attempt records.
    #[instrument(skip(self, operation), fields(max_attempts = self.max_attempts))]
    pub async fn execute_with_history<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        E: ErrorClassification + fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let first_attempt_time = Instant::now();
        let mut history = Vec::with_capacity(self.max_attempts as usize);
        let mut total_delay = Duration::ZERO;
        let mut attempt: u32 = 1;

        loop {
            debug!(attempt, max_attempts = self.max_attempts, "executing operation");

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "operation succeeded after retry");
                    }
                    history.push(OperationAttempt {
                        attempt_number: attempt,
                        outcome: AttemptOutcome::Success,
                        delay_before_next: None,
                    });
                    return RetryOutcome {
                        result: Ok(value),
                        history,
                        total_delay,
                        first_attempt_time,
                    };
                }
                Err(error) => {
                    let kind = error.failure_kind();

                    if !self.retries(kind) {
                        debug!(attempt, failure = %kind, error = %error, "non-retryable failure");
                        history.push(OperationAttempt {
                            attempt_number: attempt,
                            outcome: AttemptOutcome::FatalFailure,
                            delay_before_next: None,
                        });
                        return RetryOutcome {
                            result: Err(RetryError::NonRetryable {
                                attempts: attempt,
                                source: error,
                            }),
                            history,
                            total_delay,
                            first_attempt_time,
                        };
                    }

                    if attempt >= self.max_attempts {
                        warn!(attempts = attempt, error = %error, "retry attempts exhausted");
                        history.push(OperationAttempt {
                            attempt_number: attempt,
                            outcome: AttemptOutcome::RetryableFailure,
                            delay_before_next: None,
                        });
                        return RetryOutcome {
                            result: Err(RetryError::Exhausted {
                                attempts: attempt,
                                last_error: error,
                            }),
                            history,
                            total_delay,
                            first_attempt_time,
                        };
                    }

                    // Server hints are logged only; the backoff stays bounded by the policy.
                    let delay = self.delay_for_attempt(attempt, &mut rand::thread_rng());
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        retry_after_ms = error.retry_after().map(|d| d.as_millis() as u64),
                        error = %error,
                        "operation failed, retrying"
                    );
                    history.push(OperationAttempt {
                        attempt_number: attempt,
                        outcome: AttemptOutcome::RetryableFailure,
                        delay_before_next: Some(delay),
                    });

                    tokio::time::sleep(delay).await;
                    total_delay = total_delay.saturating_add(delay);
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            jitter: Duration::ZERO,
            retryable: BTreeSet::from([FailureKind::Transient]),
        }
    }
}

/// Builder for [`RetryPolicy`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
    conditions_set: bool,
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicyBuilder {
    pub fn new() -> Self {
        Self { policy: RetryPolicy::default(), conditions_set: false }
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.policy.max_attempts = attempts;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.policy.base_delay = delay;
        self
    }

    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.policy.backoff_factor = factor;
        self
    }

    /// Upper bound `j` of the uniform jitter `[0, j)` added to each delay.
    pub fn jitter(mut self, range: Duration) -> Self {
        self.policy.jitter = range;
        self
    }

    /// Add a retryable condition. The first call replaces the default set.
    pub fn retry_on(mut self, kind: FailureKind) -> Self {
        if !self.conditions_set {
            self.policy.retryable.clear();
            self.conditions_set = true;
        }
        self.policy.retryable.insert(kind);
        self
    }

    pub fn build(self) -> Result<RetryPolicy, PolicyError> {
        let policy = self.policy;

        if policy.max_attempts == 0 {
            return Err(PolicyError::ZeroAttempts);
        }
        if !policy.backoff_factor.is_finite() || policy.backoff_factor <= 1.0 {
            return Err(PolicyError::InvalidBackoffFactor(policy.backoff_factor.to_string()));
        }
        if policy.retryable.is_empty() {
            return Err(PolicyError::NoConditions);
        }
        for kind in [FailureKind::Authentication, FailureKind::SessionExpired] {
            if policy.retryable.contains(&kind) {
                return Err(PolicyError::UnretryableCondition(kind));
            }
        }

        Ok(policy)
    }
}

/// Run `operation` under `policy`.
pub async fn with_retry<F, Fut, T, E>(operation: F, policy: &RetryPolicy) -> RetryResult<T, E>
where
    E: ErrorClassification + fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    policy.execute(operation).await
}
