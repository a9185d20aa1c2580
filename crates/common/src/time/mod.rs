//! Wall-clock abstraction.
//!
//! Token expiry is measured against wall-clock time, so components that need
//! "now" take a [`Clock`] instead of calling `Utc::now()` directly. Tests swap
//! in [`MockClock`](crate::testing::MockClock).

use chrono::{DateTime, Utc};

/// Source of the current UTC time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock. Use this in production code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
