//! Token manager with proactive refresh
//!
//! Holds at most one [`AuthToken`] and hands out shared references to it.
//! A token is served while `now < expires_at - refresh_margin`; past that
//! point the next reader re-authenticates before returning.
//!
//! The cache lives behind a `tokio::sync::Mutex` that stays locked for the
//! whole refresh. Concurrent readers queue on the lock, so a stale token
//! triggers exactly one `authenticate` call and every waiter receives the new
//! token.

use std::sync::Arc;

use chrono::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::traits::Authenticator;
use super::types::AuthToken;
use crate::error::ErrorClassification;
use crate::time::{Clock, SystemClock};

/// Default lead time before expiry at which a token is refreshed.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::seconds(300);

/// Caches a bearer token and refreshes it before it lapses.
pub struct TokenManager<A, C = SystemClock> {
    authenticator: A,
    clock: C,
    refresh_margin: Duration,
    current: Mutex<Option<Arc<AuthToken>>>,
}

impl<A: Authenticator> TokenManager<A, SystemClock> {
    /// Create a manager on the system clock with the default margin.
    pub fn new(authenticator: A) -> Self {
        Self::with_clock(authenticator, SystemClock)
    }
}

impl<A: Authenticator, C: Clock> TokenManager<A, C> {
    pub fn with_clock(authenticator: A, clock: C) -> Self {
        Self {
            authenticator,
            clock,
            refresh_margin: DEFAULT_REFRESH_MARGIN,
            current: Mutex::new(None),
        }
    }

    /// Override the refresh margin. Negative margins are treated as zero.
    #[must_use]
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin.max(Duration::zero());
        self
    }

    pub fn refresh_margin(&self) -> Duration {
        self.refresh_margin
    }

    /// Return a token that is valid for at least `refresh_margin`,
    /// authenticating first when the cached one is missing or stale.
    ///
    /// # Errors
    /// Returns the authenticator's error unchanged. Rejected credentials
    /// classify as `Authentication`, connectivity problems as `Transient`.
    pub async fn current_token(&self) -> Result<Arc<AuthToken>, A::Error> {
        let mut guard = self.current.lock().await;

        if let Some(token) = guard.as_ref() {
            if token.is_valid_at(self.clock.now(), self.refresh_margin) {
                debug!(expires_at = %token.expires_at(), "reusing cached token");
                return Ok(Arc::clone(token));
            }
            debug!(expires_at = %token.expires_at(), "cached token inside refresh margin");
        }

        let token = self.refresh_locked(&mut guard).await?;
        Ok(token)
    }

    /// Authenticate now, replacing any cached token.
    ///
    /// # Errors
    /// Returns the authenticator's error. The previous token is dropped
    /// either way.
    pub async fn force_refresh(&self) -> Result<Arc<AuthToken>, A::Error> {
        let mut guard = self.current.lock().await;
        self.refresh_locked(&mut guard).await
    }

    /// Drop the cached token so the next read re-authenticates.
    pub async fn invalidate(&self) {
        let mut guard = self.current.lock().await;
        if guard.take().is_some() {
            info!("cached token invalidated");
        }
    }

    /// Whether a token is cached, regardless of freshness.
    pub async fn has_token(&self) -> bool {
        self.current.lock().await.is_some()
    }

    async fn refresh_locked(
        &self,
        slot: &mut Option<Arc<AuthToken>>,
    ) -> Result<Arc<AuthToken>, A::Error> {
        *slot = None;
        match self.authenticator.authenticate().await {
            Ok(token) => {
                let token = Arc::new(token);
                info!(expires_at = %token.expires_at(), "obtained new token");
                *slot = Some(Arc::clone(&token));
                Ok(token)
            }
            Err(error) => {
                warn!(failure = %error.failure_kind(), error = %error, "authentication failed");
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::FailureKind;
    use crate::testing::MockClock;

    #[derive(Debug, thiserror::Error)]
    #[error("login rejected")]
    struct Rejected;

    impl ErrorClassification for Rejected {
        fn failure_kind(&self) -> FailureKind {
            FailureKind::Authentication
        }
    }

    struct CountingAuth {
        clock: MockClock,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Authenticator for CountingAuth {
        type Error = Rejected;

        async fn authenticate(&self) -> Result<AuthToken, Rejected> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(AuthToken::new(format!("token-{n}"), self.clock.now(), Duration::seconds(3600)))
        }
    }

    fn manager(clock: &MockClock) -> TokenManager<CountingAuth, MockClock> {
        TokenManager::with_clock(
            CountingAuth { clock: clock.clone(), calls: AtomicU32::new(0) },
            clock.clone(),
        )
    }

    #[tokio::test]
    async fn test_fresh_token_is_reused() {
        let clock = MockClock::new();
        let manager = manager(&clock);

        let first = manager.current_token().await.expect("token");
        clock.advance(Duration::seconds(3299));
        let second = manager.current_token().await.expect("token");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.authenticator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_token_is_refreshed_once() {
        let clock = MockClock::new();
        let manager = manager(&clock);

        let first = manager.current_token().await.expect("token");
        clock.advance(Duration::seconds(3300));
        let second = manager.current_token().await.expect("token");
        let third = manager.current_token().await.expect("token");

        assert_eq!(first.value(), "token-1");
        assert_eq!(second.value(), "token-2");
        assert!(Arc::ptr_eq(&second, &third));
        assert_eq!(manager.authenticator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reauthentication() {
        let clock = MockClock::new();
        let manager = manager(&clock);

        manager.current_token().await.expect("token");
        manager.invalidate().await;
        assert!(!manager.has_token().await);

        let token = manager.current_token().await.expect("token");
        assert_eq!(token.value(), "token-2");
    }

    #[tokio::test]
    async fn test_custom_margin_moves_refresh_boundary() {
        let clock = MockClock::new();
        let manager = manager(&clock).with_refresh_margin(Duration::seconds(60));
        assert_eq!(manager.refresh_margin(), Duration::seconds(60));

        manager.current_token().await.expect("token");
        clock.advance(Duration::seconds(3500));
        assert_eq!(manager.current_token().await.expect("token").value(), "token-1");

        clock.advance(Duration::seconds(40));
        assert_eq!(manager.current_token().await.expect("token").value(), "token-2");
    }

    #[tokio::test]
    async fn test_authentication_failure_surfaces_classification() {
        struct AlwaysRejects;

        #[async_trait]
        impl Authenticator for AlwaysRejects {
            type Error = Rejected;

            async fn authenticate(&self) -> Result<AuthToken, Rejected> {
                Err(Rejected)
            }
        }

        let manager = TokenManager::with_clock(AlwaysRejects, MockClock::new());
        let err = manager.current_token().await.expect_err("rejected");

        assert_eq!(err.failure_kind(), FailureKind::Authentication);
        assert!(!err.is_retryable());
        assert!(!manager.has_token().await);
    }
}
