//! Test doubles shared by the workspace.
//!
//! - [`MockClock`]: wall clock that only moves when advanced.
//! - [`CountingAuthenticator`]: [`Authenticator`](crate::auth::Authenticator)
//!   that mints numbered tokens and counts calls.

pub mod mocks;
pub mod time;

pub use mocks::{CountingAuthenticator, StubAuthError};
pub use time::MockClock;
