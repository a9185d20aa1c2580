//! Token and credential values.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// Lifetime assumed for tokens the server issues without an explicit expiry.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::seconds(3600);

/// Opaque bearer token with its issue time and lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    value: String,
    issued_at: DateTime<Utc>,
    ttl: Duration,
}

impl AuthToken {
    pub fn new(value: impl Into<String>, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self { value: value.into(), issued_at, ttl }
    }

    /// The raw token, as sent in the `Authorization` header.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + self.ttl
    }

    /// `true` while `now < expires_at - margin`.
    pub fn is_valid_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now < self.expires_at() - margin
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at())
            .finish()
    }
}

/// Username and password pair used to obtain a token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
