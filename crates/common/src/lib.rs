//! Shared building blocks for the Altoro workspace.
//!
//! # Feature Tiers
//!
//! - `foundation`: failure classification ([`error`])
//! - `runtime`: async resilience ([`resilience`]), the bearer-token lifecycle
//!   ([`auth`]) and the wall-clock seam ([`time`])
//! - `test-utils`: deterministic doubles ([`testing`])

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod auth;
#[cfg(feature = "runtime")]
pub mod resilience;
#[cfg(feature = "runtime")]
pub mod time;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", all(test, feature = "runtime")))]
pub mod testing;

#[cfg(feature = "runtime")]
pub use auth::{AuthToken, Authenticator, Credentials, TokenManager};
#[cfg(feature = "foundation")]
pub use error::{ErrorClassification, ErrorSeverity, FailureKind};
#[cfg(feature = "runtime")]
pub use resilience::{
    with_retry, with_session_recovery, DiagnosticCapture, RetryError, RetryPolicy, SessionRecovery,
};
#[cfg(feature = "runtime")]
pub use time::{Clock, SystemClock};
