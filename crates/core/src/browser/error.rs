//! Browser failures and their classification.

use std::path::PathBuf;
use std::time::Duration;

use altoro_common::error::{ErrorClassification, FailureKind};
use altoro_domain::constants::SESSION_ERROR_KEYWORDS;
use thiserror::Error;

/// Errors raised by a [`BrowserDriver`](super::BrowserDriver).
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("element not found: {0}")]
    NotFound(String),

    #[error("timeout after {}ms waiting for {target}", .timeout.as_millis())]
    Timeout { target: String, timeout: Duration },

    #[error("browser session lost: {0}")]
    SessionLost(String),

    #[error("webdriver command failed: {0}")]
    Command(String),

    #[error("failed to start browser: {0}")]
    Launch(String),

    #[error("failed to write {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    #[error("unexpected page state: {0}")]
    UnexpectedState(String),
}

impl BrowserError {
    pub fn timeout(target: impl ToString, timeout: Duration) -> Self {
        Self::Timeout { target: target.to_string(), timeout }
    }
}

/// Whether a driver message reads like a lost or navigated-away session.
pub fn is_session_message(message: &str) -> bool {
    let message = message.to_lowercase();
    SESSION_ERROR_KEYWORDS.iter().any(|keyword| message.contains(keyword))
}

impl ErrorClassification for BrowserError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            // A missing element or a stalled wait usually means the site
            // bounced us back to the login form.
            Self::SessionLost(_) | Self::Timeout { .. } | Self::NotFound(_) => {
                FailureKind::SessionExpired
            }
            Self::Command(message) if is_session_message(message) => FailureKind::SessionExpired,
            Self::Command(_) | Self::Launch(_) | Self::Io { .. } | Self::UnexpectedState(_) => {
                FailureKind::Fatal
            }
        }
    }
}
