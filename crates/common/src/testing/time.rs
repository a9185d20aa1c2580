//! Controllable clock for deterministic tests.
//!
//! ```
//! use chrono::Duration;
//!
//! use altoro_common::testing::MockClock;
//! use altoro_common::time::Clock;
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::minutes(5));
//! assert_eq!(clock.now() - start, Duration::minutes(5));
//! ```

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::time::Clock;

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct MockClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Start at 2025-03-01T09:00:00Z.
    pub fn new() -> Self {
        Self::starting_at(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).single().unwrap_or_default())
    }

    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    /// Move time forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("mutex poisoned");
        *now += by;
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().expect("mutex poisoned") = to;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("mutex poisoned")
    }
}
