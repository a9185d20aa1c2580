//! Session recovery for browser-driven operations.
//!
//! When an operation fails with [`FailureKind::SessionExpired`], the wrapper
//! re-authenticates and replays the operation, up to `max_retries` times.
//! Every other failure, and a session failure after the last replay, is
//! returned to the caller unchanged.
//!
//! ```text
//!            ┌──────── ok ────────► Done
//! Executing ─┤
//!            └── err ─┬─ session expired, retries left ─► Recovering ─► Executing
//!                     └─ anything else ───────────────────► Failed
//! ```
//!
//! Diagnostic capture runs on the `Failed` edge only. The optional pause
//! before a replay doubles with each recovery when a ceiling is set.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{ErrorClassification, FailureKind};

/// Default number of recoveries per wrapped operation.
pub const DEFAULT_MAX_SESSION_RETRIES: u32 = 2;

/// Side effect run once when a wrapped operation fails terminally.
///
/// Implementations usually take a screenshot. Errors returned here are
/// logged and discarded.
#[async_trait]
pub trait DiagnosticCapture: Send + Sync {
    async fn capture(&self, label: &str) -> Result<(), String>;
}

#[async_trait]
impl<T: DiagnosticCapture + ?Sized> DiagnosticCapture for &T {
    async fn capture(&self, label: &str) -> Result<(), String> {
        (**self).capture(label).await
    }
}

/// Capture that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiagnostics;

#[async_trait]
impl DiagnosticCapture for NoDiagnostics {
    async fn capture(&self, _label: &str) -> Result<(), String> {
        Ok(())
    }
}

/// Position in the recovery loop. Terminal states own the outcome.
enum RecoveryState<T, E> {
    Executing { attempt: u32 },
    Recovering { recoveries: u32 },
    Done(T),
    Failed(E),
}

impl<T, E> RecoveryState<T, E> {
    fn phase(&self) -> &'static str {
        match self {
            Self::Executing { .. } => "executing",
            Self::Recovering { .. } => "recovering",
            Self::Done(_) => "done",
            Self::Failed(_) => "failed",
        }
    }
}

/// Configurable session recovery runner.
pub struct SessionRecovery<D = NoDiagnostics> {
    max_retries: u32,
    recovery_delay: Duration,
    max_recovery_delay: Option<Duration>,
    label: String,
    diagnostics: D,
}

impl SessionRecovery<NoDiagnostics> {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            recovery_delay: Duration::ZERO,
            max_recovery_delay: None,
            label: "operation".to_string(),
            diagnostics: NoDiagnostics,
        }
    }
}

impl Default for SessionRecovery<NoDiagnostics> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSION_RETRIES)
    }
}

impl<D: DiagnosticCapture> SessionRecovery<D> {
    /// Attach a diagnostic capture for the terminal failure path.
    pub fn with_diagnostics<D2: DiagnosticCapture>(self, diagnostics: D2) -> SessionRecovery<D2> {
        SessionRecovery {
            max_retries: self.max_retries,
            recovery_delay: self.recovery_delay,
            max_recovery_delay: self.max_recovery_delay,
            label: self.label,
            diagnostics,
        }
    }

    /// Pause between a successful re-authentication and the replay.
    pub fn with_recovery_delay(mut self, delay: Duration) -> Self {
        self.recovery_delay = delay;
        self
    }

    /// Double the recovery delay after each recovery, up to `ceiling`.
    pub fn with_recovery_backoff(mut self, ceiling: Duration) -> Self {
        self.max_recovery_delay = Some(ceiling);
        self
    }

    /// Pause before the replay following recovery number `recovery`
    /// (1-based).
    pub fn delay_for_recovery(&self, recovery: u32) -> Duration {
        match self.max_recovery_delay {
            None => self.recovery_delay,
            Some(ceiling) => {
                let factor = 2u32.saturating_pow(recovery.saturating_sub(1));
                self.recovery_delay.saturating_mul(factor).min(ceiling)
            }
        }
    }

    /// Name used in logs and passed to the diagnostic capture.
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Run `operation`, re-authenticating with `reauth` on session expiry.
    ///
    /// # Errors
    /// Returns the operation's own error when it is not a session expiry or
    /// when recoveries are exhausted, or the re-authentication error if
    /// recovery itself fails.
    pub async fn run<Op, OpFut, Re, ReFut, T, E>(
        &self,
        mut operation: Op,
        mut reauth: Re,
    ) -> Result<T, E>
    where
        E: ErrorClassification + fmt::Display,
        Op: FnMut() -> OpFut,
        OpFut: Future<Output = Result<T, E>>,
        Re: FnMut() -> ReFut,
        ReFut: Future<Output = Result<(), E>>,
    {
        let mut recoveries: u32 = 0;
        let mut state = RecoveryState::Executing { attempt: 1 };

        loop {
            debug!(label = %self.label, phase = state.phase(), recoveries, "session recovery step");
            state = match state {
                RecoveryState::Executing { attempt } => match operation().await {
                    Ok(value) => RecoveryState::Done(value),
                    Err(error)
                        if error.failure_kind() == FailureKind::SessionExpired
                            && recoveries < self.max_retries =>
                    {
                        warn!(
                            label = %self.label,
                            attempt,
                            error = %error,
                            "session expired, re-authenticating"
                        );
                        recoveries += 1;
                        RecoveryState::Recovering { recoveries }
                    }
                    Err(error) => {
                        if error.failure_kind() == FailureKind::SessionExpired {
                            warn!(label = %self.label, recoveries, "session recovery exhausted");
                        }
                        RecoveryState::Failed(error)
                    }
                },
                RecoveryState::Recovering { recoveries } => {
                    if let Err(error) = reauth().await {
                        warn!(label = %self.label, error = %error, "re-authentication failed");
                        return Err(error);
                    }
                    let delay = self.delay_for_recovery(recoveries);
                    if !delay.is_zero() {
                        debug!(
                            label = %self.label,
                            recoveries,
                            delay_ms = delay.as_millis() as u64,
                            "pausing before replay"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RecoveryState::Executing { attempt: recoveries + 1 }
                }
                RecoveryState::Done(value) => {
                    if recoveries > 0 {
                        info!(
                            label = %self.label,
                            recoveries,
                            "operation succeeded after session recovery"
                        );
                    }
                    return Ok(value);
                }
                RecoveryState::Failed(error) => {
                    debug!(label = %self.label, error = %error, "operation failed");
                    if let Err(capture_error) = self.diagnostics.capture(&self.label).await {
                        warn!(
                            label = %self.label,
                            error = %capture_error,
                            "diagnostic capture failed"
                        );
                    }
                    return Err(error);
                }
            };
        }
    }
}

/// Run `operation` with up to `max_retries` session recoveries.
pub async fn with_session_recovery<Op, OpFut, Re, ReFut, T, E>(
    operation: Op,
    reauth: Re,
    max_retries: u32,
) -> Result<T, E>
where
    E: ErrorClassification + fmt::Display,
    Op: FnMut() -> OpFut,
    OpFut: Future<Output = Result<T, E>>,
    Re: FnMut() -> ReFut,
    ReFut: Future<Output = Result<(), E>>,
{
    SessionRecovery::new(max_retries).run(operation, reauth).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct PageError(FailureKind, &'static str);

    impl fmt::Display for PageError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}: {}", self.0, self.1)
        }
    }

    impl ErrorClassification for PageError {
        fn failure_kind(&self) -> FailureKind {
            self.0
        }
    }

    #[derive(Default)]
    struct CountingCapture {
        calls: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl DiagnosticCapture for CountingCapture {
        async fn capture(&self, _label: &str) -> Result<(), String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("disk full".into())
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_recovers_once_after_session_expiry() {
        let ops = Arc::new(AtomicU32::new(0));
        let reauths = Arc::new(AtomicU32::new(0));
        let capture = CountingCapture::default();
        let (o, r) = (ops.clone(), reauths.clone());

        let result = SessionRecovery::new(2)
            .with_diagnostics(&capture)
            .labelled("accounts")
            .run(
                || {
                    let n = o.fetch_add(1, Ordering::SeqCst) + 1;
                    async move {
                        if n == 1 {
                            Err(PageError(FailureKind::SessionExpired, "detached"))
                        } else {
                            Ok("summary")
                        }
                    }
                },
                || {
                    r.fetch_add(1, Ordering::SeqCst);
                    async { Ok(()) }
                },
            )
            .await;

        assert_eq!(result, Ok("summary"));
        assert_eq!(ops.load(Ordering::SeqCst), 2);
        assert_eq!(reauths.load(Ordering::SeqCst), 1);
        assert_eq!(capture.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_failures_never_reauthenticate() {
        for kind in [FailureKind::Transient, FailureKind::Fatal, FailureKind::Authentication] {
            let reauths = Arc::new(AtomicU32::new(0));
            let capture = CountingCapture::default();
            let r = reauths.clone();

            let result: Result<(), _> = SessionRecovery::new(3)
                .with_diagnostics(&capture)
                .run(
                    || async move { Err(PageError(kind, "boom")) },
                    || {
                        r.fetch_add(1, Ordering::SeqCst);
                        async { Ok(()) }
                    },
                )
                .await;

            assert_eq!(result, Err(PageError(kind, "boom")));
            assert_eq!(reauths.load(Ordering::SeqCst), 0);
            assert_eq!(capture.calls.load(Ordering::SeqCst), 1);
        }
    }

    /// Validates the attempt bound and that the original error surfaces
    /// unchanged with exactly one diagnostic capture.
    #[tokio::test]
    async fn test_exhausted_recovery_returns_original_error() {
        let ops = Arc::new(AtomicU32::new(0));
        let reauths = Arc::new(AtomicU32::new(0));
        let capture = CountingCapture::default();
        let (o, r) = (ops.clone(), reauths.clone());

        let result: Result<(), _> = SessionRecovery::new(2)
            .with_diagnostics(&capture)
            .run(
                || {
                    o.fetch_add(1, Ordering::SeqCst);
                    async { Err(PageError(FailureKind::SessionExpired, "target closed")) }
                },
                || {
                    r.fetch_add(1, Ordering::SeqCst);
                    async { Ok(()) }
                },
            )
            .await;

        assert_eq!(result, Err(PageError(FailureKind::SessionExpired, "target closed")));
        assert_eq!(ops.load(Ordering::SeqCst), 3);
        assert_eq!(reauths.load(Ordering::SeqCst), 2);
        assert_eq!(capture.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_retries_runs_once() {
        let ops = Arc::new(AtomicU32::new(0));
        let o = ops.clone();

        let result: Result<(), _> = with_session_recovery(
            || {
                o.fetch_add(1, Ordering::SeqCst);
                async { Err(PageError(FailureKind::SessionExpired, "navigation")) }
            },
            || async { Ok(()) },
            0,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(ops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reauth_failure_propagates() {
        let capture = CountingCapture::default();

        let result: Result<(), _> = SessionRecovery::new(2)
            .with_diagnostics(&capture)
            .run(
                || async { Err(PageError(FailureKind::SessionExpired, "detached")) },
                || async { Err(PageError(FailureKind::Authentication, "bad password")) },
            )
            .await;

        assert_eq!(result, Err(PageError(FailureKind::Authentication, "bad password")));
        assert_eq!(capture.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_capture_does_not_mask_error() {
        let capture = CountingCapture { calls: AtomicU32::new(0), fail: true };

        let result: Result<(), _> = SessionRecovery::new(1)
            .with_diagnostics(&capture)
            .run(
                || async { Err(PageError(FailureKind::Fatal, "missing element")) },
                || async { Ok(()) },
            )
            .await;

        assert_eq!(result, Err(PageError(FailureKind::Fatal, "missing element")));
        assert_eq!(capture.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_delay_is_applied() {
        let start = tokio::time::Instant::now();
        let ops = Arc::new(AtomicU32::new(0));
        let o = ops.clone();

        let result = SessionRecovery::new(1)
            .with_recovery_delay(Duration::from_secs(2))
            .run(
                || {
                    let n = o.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n == 0 {
                            Err(PageError(FailureKind::SessionExpired, "timeout"))
                        } else {
                            Ok(n)
                        }
                    }
                },
                || async { Ok(()) },
            )
            .await;

        assert_eq!(result, Ok(1));
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[test]
    fn test_recovery_backoff_doubles_up_to_ceiling() {
        let recovery = SessionRecovery::new(5)
            .with_recovery_delay(Duration::from_secs(2))
            .with_recovery_backoff(Duration::from_secs(8));

        let delays: Vec<u64> = (1..=4).map(|n| recovery.delay_for_recovery(n).as_secs()).collect();

        assert_eq!(delays, [2, 4, 8, 8]);
        assert_eq!(SessionRecovery::new(1).delay_for_recovery(3), Duration::ZERO);
    }
}
