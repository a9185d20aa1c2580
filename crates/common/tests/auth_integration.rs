//! Integration tests for the token manager under concurrency.

#![cfg(feature = "test-utils")]

use std::sync::Arc;
use std::time::Duration as StdDuration;

use altoro_common::auth::TokenManager;
use altoro_common::error::{ErrorClassification, FailureKind};
use altoro_common::testing::{CountingAuthenticator, MockClock};
use chrono::Duration;

/// Validates that a burst of readers on an empty cache triggers exactly one
/// authentication and all of them receive the same token.
///
/// # Test Steps
/// 1. Authenticator sleeps inside `authenticate` so readers overlap
/// 2. Spawn 16 concurrent `current_token` calls
/// 3. Verify one call and one shared token instance
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_share_single_refresh() {
    let clock = MockClock::new();
    let auth = Arc::new(
        CountingAuthenticator::new(clock.clone()).with_latency(StdDuration::from_millis(50)),
    );
    let manager = Arc::new(TokenManager::with_clock(Arc::clone(&auth), clock.clone()));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.current_token().await })
        })
        .collect();

    let mut tokens = Vec::new();
    for handle in handles {
        tokens.push(handle.await.expect("task joined").expect("token issued"));
    }

    assert_eq!(auth.calls(), 1);
    assert!(tokens.iter().all(|t| Arc::ptr_eq(t, &tokens[0])));
}

/// Validates that readers arriving after the refresh boundary trigger a
/// single refresh, not one each.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stale_token_refreshed_once_under_contention() {
    let clock = MockClock::new();
    let auth = Arc::new(
        CountingAuthenticator::new(clock.clone()).with_latency(StdDuration::from_millis(20)),
    );
    let manager = Arc::new(TokenManager::with_clock(Arc::clone(&auth), clock.clone()));

    let first = manager.current_token().await.expect("initial token");
    clock.advance(Duration::minutes(56));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.current_token().await })
        })
        .collect();

    for handle in handles {
        let token = handle.await.expect("task joined").expect("token issued");
        assert_eq!(token.value(), "token-2");
    }
    assert_eq!(first.value(), "token-1");
    assert_eq!(auth.calls(), 2);
}

#[tokio::test]
async fn test_transient_failure_is_distinct_from_rejection() {
    let clock = MockClock::new();
    let auth = Arc::new(CountingAuthenticator::new(clock.clone()));
    let manager = TokenManager::with_clock(Arc::clone(&auth), clock);

    auth.fail_next(FailureKind::Transient);
    let transient = manager.current_token().await.expect_err("queued failure");
    assert!(transient.is_retryable());

    auth.fail_next(FailureKind::Authentication);
    let rejected = manager.current_token().await.expect_err("queued failure");
    assert_eq!(rejected.failure_kind(), FailureKind::Authentication);
    assert!(!rejected.is_retryable());

    let token = manager.current_token().await.expect("recovered");
    assert_eq!(token.value(), "token-3");
}

#[tokio::test]
async fn test_force_refresh_replaces_valid_token() {
    let clock = MockClock::new();
    let auth = Arc::new(CountingAuthenticator::new(clock.clone()));
    let manager = TokenManager::with_clock(Arc::clone(&auth), clock);

    let first = manager.current_token().await.expect("token");
    let forced = manager.force_refresh().await.expect("token");
    let after = manager.current_token().await.expect("token");

    assert_ne!(first.value(), forced.value());
    assert!(Arc::ptr_eq(&forced, &after));
}
