//! REST API failures and their classification.

use std::time::Duration;

use altoro_common::error::{ErrorClassification, FailureKind};
use thiserror::Error;

/// Longest response body kept on an error.
const BODY_EXCERPT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Credentials or token rejected (401/403).
    #[error("authentication rejected ({status}): {body}")]
    Auth { status: u16, body: String },

    /// Login succeeded but carried no token.
    #[error("login response has no Authorization value")]
    MissingToken,

    #[error("server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("request rejected ({status}): {body}")]
    Client { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Map a non-success HTTP status onto a variant. The body is cut to a
    /// short excerpt.
    pub fn from_status(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        let body: String = body.chars().take(BODY_EXCERPT).collect();
        match status {
            401 | 403 => Self::Auth { status, body },
            429 => Self::RateLimited { retry_after },
            500 | 502 | 503 | 504 => Self::Server { status, body },
            _ => Self::Client { status, body },
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::MissingToken)
    }
}

impl ErrorClassification for ApiError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Auth { .. } | Self::MissingToken => FailureKind::Authentication,
            Self::Server { .. }
            | Self::RateLimited { .. }
            | Self::Network(_)
            | Self::Timeout(_) => FailureKind::Transient,
            Self::Client { .. } | Self::Decode(_) => FailureKind::Fatal,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification_table() {
        let cases = [
            (401, FailureKind::Authentication),
            (403, FailureKind::Authentication),
            (500, FailureKind::Transient),
            (502, FailureKind::Transient),
            (503, FailureKind::Transient),
            (504, FailureKind::Transient),
            (429, FailureKind::Transient),
            (400, FailureKind::Fatal),
            (404, FailureKind::Fatal),
            (501, FailureKind::Fatal),
            (418, FailureKind::Fatal),
        ];
        for (status, kind) in cases {
            assert_eq!(
                ApiError::from_status(status, "", None).failure_kind(),
                kind,
                "status {status}"
            );
        }
    }

    #[test]
    fn test_transport_failures_are_transient() {
        assert!(ApiError::Network("connection refused".into()).is_retryable());
        assert!(ApiError::Timeout(Duration::from_secs(20)).is_retryable());
        assert!(!ApiError::Decode("expected object".into()).is_retryable());
        assert!(ApiError::MissingToken.is_auth());
    }

    #[test]
    fn test_rate_limit_carries_retry_after() {
        let err = ApiError::from_status(429, "slow down", Some(Duration::from_secs(3)));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_body_is_truncated() {
        let long = "x".repeat(2_000);
        let ApiError::Server { body, .. } = ApiError::from_status(503, &long, None) else {
            panic!("expected server error");
        };
        assert_eq!(body.len(), BODY_EXCERPT);
    }
}
