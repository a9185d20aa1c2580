//! Transport seam for the Altoro Mutual REST API.

use std::fmt;

use altoro_common::auth::Credentials;
use async_trait::async_trait;
use serde_json::Value;

use super::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
        })
    }
}

/// Raw HTTP access to the API. Paths are relative to the site root, for
/// example `/api/account`.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// `POST /api/login`. Returns the token with any `Bearer ` prefix
    /// removed.
    async fn authenticate(&self, credentials: &Credentials) -> Result<String, ApiError>;

    /// Send one request with `token` in the `Authorization` header and
    /// decode the JSON body.
    async fn request(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError>;
}

/// Strip a leading `Bearer ` from a login response value. Blank values are
/// treated as missing.
pub fn bearer_token(raw: &str) -> Result<String, ApiError> {
    let token = raw.trim_start().strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        return Err(ApiError::MissingToken);
    }
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_prefix_is_stripped() {
        assert_eq!(bearer_token("Bearer abc123").as_deref(), Ok("abc123"));
        assert_eq!(bearer_token("abc123").as_deref(), Ok("abc123"));
        assert_eq!(bearer_token("  "), Err(ApiError::MissingToken));
        assert_eq!(bearer_token("Bearer "), Err(ApiError::MissingToken));
    }
}
