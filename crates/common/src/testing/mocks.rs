//! Authenticator double for token-manager tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;

use super::time::MockClock;
use crate::auth::{AuthToken, Authenticator};
use crate::error::{ErrorClassification, FailureKind};
use crate::time::Clock;

/// Error produced by [`CountingAuthenticator`] when a failure is queued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stub authentication failure ({kind})")]
pub struct StubAuthError {
    pub kind: FailureKind,
}

impl ErrorClassification for StubAuthError {
    fn failure_kind(&self) -> FailureKind {
        self.kind
    }
}

/// Issues `token-1`, `token-2`, ... stamped with the mock clock's time.
///
/// An optional latency makes concurrent callers overlap inside
/// `authenticate`. Queued failures are returned before any token is minted.
#[derive(Debug)]
pub struct CountingAuthenticator {
    clock: MockClock,
    ttl: Duration,
    latency: StdDuration,
    calls: AtomicU32,
    failures: Mutex<Vec<FailureKind>>,
}

impl CountingAuthenticator {
    pub fn new(clock: MockClock) -> Self {
        Self {
            clock,
            ttl: Duration::seconds(3600),
            latency: StdDuration::ZERO,
            calls: AtomicU32::new(0),
            failures: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_latency(mut self, latency: StdDuration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the next call fail with `kind`.
    pub fn fail_next(&self, kind: FailureKind) {
        self.failures.lock().expect("mutex poisoned").push(kind);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for CountingAuthenticator {
    type Error = StubAuthError;

    async fn authenticate(&self) -> Result<AuthToken, StubAuthError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let queued = {
            let mut failures = self.failures.lock().expect("mutex poisoned");
            if failures.is_empty() {
                None
            } else {
                Some(failures.remove(0))
            }
        };
        if let Some(kind) = queued {
            return Err(StubAuthError { kind });
        }
        Ok(AuthToken::new(format!("token-{n}"), self.clock.now(), self.ttl))
    }
}
