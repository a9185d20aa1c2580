use std::time::Duration;

use altoro_common::auth::Credentials;
use altoro_core::bank_api::{bearer_token, ApiError, ApiTransport, Method};
use altoro_domain::{AltoroError, Settings};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use serde_json::{json, Value};
use tracing::{debug, instrument};
use url::Url;

use crate::errors::http_error;

/// Key of the token in a login response body.
const LOGIN_TOKEN_FIELD: &str = "Authorization";

/// [`ApiTransport`] over reqwest. Retries and token reuse happen above this
/// layer, so every call is a single request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl HttpTransport {
    /// Start building a transport for `base_url`.
    pub fn builder(base_url: Url) -> HttpTransportBuilder {
        HttpTransportBuilder::new(base_url)
    }

    /// Transport for the configured site and API timeout.
    ///
    /// # Errors
    /// `AltoroError::Config` when the HTTP client cannot be built.
    pub fn from_settings(settings: &Settings) -> Result<Self, AltoroError> {
        Self::builder(settings.site().base_url.clone()).timeout(settings.api().timeout).build()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path.trim_start_matches('/'))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| http_error(&e, self.timeout))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let retry_after = retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status.as_u16(), &body, retry_after))
    }

    async fn json(&self, response: Response) -> Result<Value, ApiError> {
        let text = response.text().await.map_err(|e| http_error(&e, self.timeout))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// `Retry-After` in seconds. HTTP-date values are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok().map(Duration::from_secs)
}

#[async_trait]
impl ApiTransport for HttpTransport {
    #[instrument(skip_all, fields(username = %credentials.username))]
    async fn authenticate(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let url = self.url("/api/login");
        debug!(%url, "POST login");
        let body = json!({"username": credentials.username, "password": credentials.password});
        let response = self.send(self.client.post(&url).json(&body)).await?;

        // Some deployments return the token as a header instead of a field.
        let header = response
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = self.json(response).await?;
        let raw =
            body.get(LOGIN_TOKEN_FIELD).and_then(Value::as_str).map(str::to_string).or(header);
        bearer_token(raw.as_deref().unwrap_or_default())
    }

    #[instrument(skip(self, token, body))]
    async fn request(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = self.url(path);
        let builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        let builder = builder.header(AUTHORIZATION, token);
        let builder = match body {
            Some(body) => builder.json(body),
            None => builder,
        };
        debug!(%url, "sending API request");
        let response = self.send(builder).await?;
        debug!(%url, status = %response.status(), "received API response");
        self.json(response).await
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug)]
pub struct HttpTransportBuilder {
    base_url: Url,
    timeout: Duration,
    user_agent: Option<String>,
}

impl HttpTransportBuilder {
    fn new(base_url: Url) -> Self {
        Self { base_url, timeout: Duration::from_secs(20), user_agent: None }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// # Errors
    /// `AltoroError::Config` when reqwest rejects the client settings.
    pub fn build(self) -> Result<HttpTransport, AltoroError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|e| AltoroError::Config(format!("HTTP client: {e}")))?;
        Ok(HttpTransport { client, base_url: self.base_url, timeout: self.timeout })
    }
}

#[cfg(test)]
mod tests {
    use altoro_common::error::{ErrorClassification, FailureKind};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn transport(server: &MockServer) -> HttpTransport {
        let base = Url::parse(&server.uri()).expect("mock uri");
        HttpTransport::builder(base).timeout(Duration::from_millis(500)).build().expect("transport")
    }

    #[tokio::test]
    async fn test_login_strips_bearer_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .and(body_json(json!({"username": "jsmith", "password": "demo1234"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"Authorization": "Bearer abc.def"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let token =
            transport(&server).await.authenticate(&Credentials::new("jsmith", "demo1234")).await;

        assert_eq!(token.as_deref(), Ok("abc.def"));
    }

    #[tokio::test]
    async fn test_login_without_token_is_an_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;

        let err = transport(&server)
            .await
            .authenticate(&Credentials::new("jsmith", "x"))
            .await
            .expect_err("no token");

        assert_eq!(err, ApiError::MissingToken);
        assert_eq!(err.failure_kind(), FailureKind::Authentication);
    }

    #[tokio::test]
    async fn test_rejected_login_maps_to_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&server)
            .await;

        let err = transport(&server)
            .await
            .authenticate(&Credentials::new("jsmith", "x"))
            .await
            .expect_err("401");

        assert_eq!(err, ApiError::Auth { status: 401, body: "bad credentials".into() });
    }

    #[tokio::test]
    async fn test_request_sends_raw_token_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/account/800002/transactions"))
            .and(header("Authorization", "abc.def"))
            .and(body_json(json!({"startDate": "2025-02-01", "endDate": "2025-04-15"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"transactions": []})))
            .expect(1)
            .mount(&server)
            .await;

        let body = json!({"startDate": "2025-02-01", "endDate": "2025-04-15"});
        let value = transport(&server)
            .await
            .request(Method::Post, "/api/account/800002/transactions", "abc.def", Some(&body))
            .await
            .expect("response");

        assert_eq!(value, json!({"transactions": []}));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/account"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/account/1"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/account/2"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let transport = transport(&server).await;

        let limited =
            transport.request(Method::Get, "/api/account", "t", None).await.expect_err("429");
        assert_eq!(limited, ApiError::RateLimited { retry_after: Some(Duration::from_secs(7)) });

        let server_err =
            transport.request(Method::Get, "/api/account/1", "t", None).await.expect_err("503");
        assert_eq!(server_err.failure_kind(), FailureKind::Transient);

        let missing =
            transport.request(Method::Get, "/api/account/2", "t", None).await.expect_err("404");
        assert_eq!(missing.failure_kind(), FailureKind::Fatal);
    }

    #[tokio::test]
    async fn test_invalid_json_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/account"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = transport(&server)
            .await
            .request(Method::Get, "/api/account", "t", None)
            .await
            .expect_err("html");

        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/account"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let err = transport(&server)
            .await
            .request(Method::Get, "/api/account", "t", None)
            .await
            .expect_err("slow");

        assert_eq!(err, ApiError::Timeout(Duration::from_millis(500)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transient() {
        let base = Url::parse("http://127.0.0.1:9").expect("url");
        let transport = HttpTransport::builder(base)
            .timeout(Duration::from_millis(500))
            .build()
            .expect("transport");

        let err =
            transport.request(Method::Get, "/api/account", "t", None).await.expect_err("refused");

        assert_eq!(err.failure_kind(), FailureKind::Transient);
    }
}
