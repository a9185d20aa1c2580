//! Resilience primitives for the scraping and API layers.
//!
//! - [`retry`]: exponential backoff with jitter, driven by
//!   [`FailureKind`](crate::error::FailureKind) classification.
//! - [`session`]: re-authenticate and replay when a browser session lapses.
//!
//! Both wrap an `FnMut() -> Future` so the caller keeps ownership of
//! whatever the operation borrows.

pub mod retry;
pub mod session;

pub use retry::{
    with_retry, AttemptOutcome, OperationAttempt, PolicyError, RetryError, RetryOutcome,
    RetryPolicy, RetryPolicyBuilder, RetryResult,
};
pub use session::{
    with_session_recovery, DiagnosticCapture, NoDiagnostics, SessionRecovery,
    DEFAULT_MAX_SESSION_RETRIES,
};
