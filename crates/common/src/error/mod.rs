//! Failure classification shared by every Altoro crate.
//!
//! Retry and session-recovery decisions never look at concrete error types.
//! They ask the error how it should be treated through the
//! [`ErrorClassification`] trait, which maps each failure onto one of four
//! [`FailureKind`]s:
//!
//! | Kind | Examples | Handling |
//! |------|----------|----------|
//! | `Transient` | connect error, HTTP 500, request timeout | retried by the retry policy |
//! | `SessionExpired` | detached page, redirect to the login form | re-authenticate and replay |
//! | `Authentication` | HTTP 401/403, rejected credentials | fatal, never retried |
//! | `Fatal` | malformed payload, missing element, bad input | propagated immediately |
//!
//! ## Example
//!
//! ```rust
//! use altoro_common::error::{ErrorClassification, ErrorSeverity, FailureKind};
//!
//! #[derive(Debug)]
//! enum FetchError {
//!     Unreachable,
//!     Rejected,
//! }
//!
//! impl ErrorClassification for FetchError {
//!     fn failure_kind(&self) -> FailureKind {
//!         match self {
//!             Self::Unreachable => FailureKind::Transient,
//!             Self::Rejected => FailureKind::Authentication,
//!         }
//!     }
//! }
//!
//! assert!(FetchError::Unreachable.is_retryable());
//! assert_eq!(FetchError::Rejected.severity(), ErrorSeverity::Error);
//! ```

use std::fmt;
use std::time::Duration;

/// Coarse failure taxonomy used by the resilience layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    /// Network blip, server-side 5xx, transport timeout.
    Transient,
    /// The authenticated browser session is gone.
    SessionExpired,
    /// Credentials were rejected.
    Authentication,
    /// Anything else.
    Fatal,
}

impl FailureKind {
    /// Stable label used in structured logs and report rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::SessionExpired => "session_expired",
            Self::Authentication => "authentication",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error classification trait for consistent failure handling across crates.
///
/// Only [`failure_kind`](Self::failure_kind) is required. The remaining
/// methods derive from it and may be overridden when an error knows better,
/// for example a rate-limit response carrying `Retry-After`.
pub trait ErrorClassification {
    /// The taxonomy bucket this failure falls into.
    fn failure_kind(&self) -> FailureKind;

    /// Whether a plain retry may succeed.
    fn is_retryable(&self) -> bool {
        self.failure_kind() == FailureKind::Transient
    }

    /// Whether the failure signals a lapsed session.
    fn is_session_expired(&self) -> bool {
        self.failure_kind() == FailureKind::SessionExpired
    }

    /// Severity used for log levels and report rows.
    fn severity(&self) -> ErrorSeverity {
        match self.failure_kind() {
            FailureKind::Transient | FailureKind::SessionExpired => ErrorSeverity::Warning,
            FailureKind::Authentication | FailureKind::Fatal => ErrorSeverity::Error,
        }
    }

    /// Whether this requires immediate attention.
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Suggested delay before retrying, if the failure carries one.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl<T: ErrorClassification + ?Sized> ErrorClassification for Box<T> {
    fn failure_kind(&self) -> FailureKind {
        (**self).failure_kind()
    }

    fn severity(&self) -> ErrorSeverity {
        (**self).severity()
    }

    fn retry_after(&self) -> Option<Duration> {
        (**self).retry_after()
    }
}

/// Error severity levels for monitoring and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Degraded but operational
    Warning,
    /// Failure requiring attention
    Error,
    /// Immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for failure classification defaults.
    use super::*;

    #[derive(Debug)]
    struct Classified(FailureKind);

    impl ErrorClassification for Classified {
        fn failure_kind(&self) -> FailureKind {
            self.0
        }
    }

    /// Validates that only transient failures are considered retryable.
    #[test]
    fn test_only_transient_is_retryable() {
        assert!(Classified(FailureKind::Transient).is_retryable());
        assert!(!Classified(FailureKind::SessionExpired).is_retryable());
        assert!(!Classified(FailureKind::Authentication).is_retryable());
        assert!(!Classified(FailureKind::Fatal).is_retryable());
    }

    #[test]
    fn test_session_expired_detection() {
        assert!(Classified(FailureKind::SessionExpired).is_session_expired());
        assert!(!Classified(FailureKind::Transient).is_session_expired());
    }

    #[test]
    fn test_default_severity_mapping() {
        assert_eq!(Classified(FailureKind::Transient).severity(), ErrorSeverity::Warning);
        assert_eq!(Classified(FailureKind::SessionExpired).severity(), ErrorSeverity::Warning);
        assert_eq!(Classified(FailureKind::Authentication).severity(), ErrorSeverity::Error);
        assert_eq!(Classified(FailureKind::Fatal).severity(), ErrorSeverity::Error);
        assert!(!Classified(FailureKind::Fatal).is_critical());
    }

    #[test]
    fn test_boxed_errors_delegate() {
        let boxed: Box<Classified> = Box::new(Classified(FailureKind::Transient));
        assert_eq!(boxed.failure_kind(), FailureKind::Transient);
        assert!(boxed.retry_after().is_none());
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(FailureKind::SessionExpired.to_string(), "session_expired");
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
        assert!(ErrorSeverity::Critical > ErrorSeverity::Error);
    }
}
