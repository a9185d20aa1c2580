//! Typed client for the Altoro Mutual REST API.
//!
//! Every call goes through the retry policy built from [`ApiSettings`], and
//! every attempt asks the [`TokenManager`] for a token first, so an expired
//! token is refreshed before the request rather than after a rejection.

use std::sync::Arc;

use altoro_common::auth::{AuthToken, Authenticator, Credentials, TokenManager};
use altoro_common::resilience::{RetryError, RetryPolicy};
use altoro_common::time::{Clock, SystemClock};
use altoro_domain::config::ApiSettings;
use altoro_domain::{AltoroError, ApiAccount, ApiTransaction};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::error::ApiError;
use super::parse;
use super::ports::{ApiTransport, Method};

/// Turns the transport's login call into timestamped tokens.
pub struct TransportAuthenticator<C = SystemClock> {
    transport: Arc<dyn ApiTransport>,
    credentials: Credentials,
    ttl: chrono::Duration,
    clock: C,
}

impl<C: Clock> TransportAuthenticator<C> {
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        credentials: Credentials,
        ttl: chrono::Duration,
        clock: C,
    ) -> Self {
        Self { transport, credentials, ttl, clock }
    }
}

#[async_trait]
impl<C: Clock> Authenticator for TransportAuthenticator<C> {
    type Error = ApiError;

    async fn authenticate(&self) -> Result<AuthToken, ApiError> {
        info!(user = %self.credentials.username, "authenticating against the API");
        let value = self.transport.authenticate(&self.credentials).await?;
        Ok(AuthToken::new(value, self.clock.now(), self.ttl))
    }
}

fn chrono_duration(d: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}

pub struct AltoroApi<C = SystemClock> {
    transport: Arc<dyn ApiTransport>,
    tokens: TokenManager<TransportAuthenticator<C>, C>,
    policy: RetryPolicy,
}

impl AltoroApi<SystemClock> {
    /// # Errors
    /// `AltoroError::Config` when the retry settings do not form a valid
    /// policy.
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        settings: &ApiSettings,
    ) -> altoro_domain::Result<Self> {
        Self::with_clock(transport, settings, SystemClock)
    }
}

impl<C: Clock + Clone> AltoroApi<C> {
    /// # Errors
    /// `AltoroError::Config` when the retry settings do not form a valid
    /// policy.
    pub fn with_clock(
        transport: Arc<dyn ApiTransport>,
        settings: &ApiSettings,
        clock: C,
    ) -> altoro_domain::Result<Self> {
        let policy = RetryPolicy::builder()
            .max_attempts(settings.max_attempts)
            .base_delay(settings.backoff_base)
            .backoff_factor(settings.backoff_factor)
            .jitter(settings.jitter)
            .build()
            .map_err(|e| AltoroError::Config(format!("API retry policy: {e}")))?;
        let authenticator = TransportAuthenticator::new(
            Arc::clone(&transport),
            Credentials::new(&settings.username, &settings.password),
            chrono_duration(settings.token_ttl),
            clock.clone(),
        );
        let tokens = TokenManager::with_clock(authenticator, clock)
            .with_refresh_margin(chrono_duration(settings.token_refresh_margin));
        Ok(Self { transport, tokens, policy })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Obtain (or reuse) a token, retrying transient login failures.
    ///
    /// # Errors
    /// `ApiError::Auth`/`MissingToken` for rejected credentials; the last
    /// transient error once retries are exhausted.
    pub async fn authenticate(&self) -> Result<Arc<AuthToken>, ApiError> {
        let tokens = &self.tokens;
        self.policy.execute(move || tokens.current_token()).await.map_err(RetryError::into_inner)
    }

    /// Drop the cached token.
    pub async fn invalidate_token(&self) {
        self.tokens.invalidate().await;
    }

    /// `GET /api/account`: the account ids.
    pub async fn account_ids(&self) -> Result<Vec<String>, ApiError> {
        let body = self.call(Method::Get, "/api/account", None).await?;
        let ids = parse::account_ids(&body);
        info!(accounts = ids.len(), "retrieved account list");
        Ok(ids)
    }

    /// `GET /api/account/{id}`.
    pub async fn account_details(&self, account_id: &str) -> Result<ApiAccount, ApiError> {
        let body = self.call(Method::Get, &format!("/api/account/{account_id}"), None).await?;
        debug!(account_id, "retrieved account details");
        Ok(parse::account_details(account_id, &body))
    }

    /// Date-filtered `POST /api/account/{id}/transactions`, or the
    /// last-ten `GET` when no range is given.
    pub async fn transactions(
        &self,
        account_id: &str,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<ApiTransaction>, ApiError> {
        let path = format!("/api/account/{account_id}/transactions");
        let body = match range {
            Some((start, end)) => {
                let filter = json!({
                    "startDate": start.format("%Y-%m-%d").to_string(),
                    "endDate": end.format("%Y-%m-%d").to_string(),
                });
                self.call(Method::Post, &path, Some(filter)).await?
            }
            None => self.call(Method::Get, &path, None).await?,
        };
        let txns = parse::transactions(account_id, &body);
        info!(account_id, transactions = txns.len(), "retrieved transactions");
        Ok(txns)
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let body = body.as_ref();
        let transport = self.transport.as_ref();
        let tokens = &self.tokens;
        self.policy
            .execute(move || async move {
                let token = tokens.current_token().await?;
                debug!(%method, path, "API request");
                match transport.request(method, path, token.value(), body).await {
                    Err(error) if error.is_auth() => {
                        warn!(%method, path, %error, "token rejected");
                        tokens.invalidate().await;
                        Err(error)
                    }
                    other => other,
                }
            })
            .await
            .map_err(RetryError::into_inner)
    }
}
