//! In-memory [`ApiTransport`] with routed JSON responses.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use altoro_common::auth::Credentials;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::bank_api::{ApiError, ApiTransport, Method};

/// One request seen by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct FakeRequest {
    pub method: Method,
    pub path: String,
    pub token: String,
    pub body: Option<Value>,
}

type Route = (Method, String);

#[derive(Default)]
struct Inner {
    login_calls: AtomicU32,
    login_failures: Mutex<VecDeque<ApiError>>,
    once: Mutex<HashMap<Route, VecDeque<Result<Value, ApiError>>>>,
    routes: Mutex<HashMap<Route, Result<Value, ApiError>>>,
    requests: Mutex<Vec<FakeRequest>>,
}

/// Logins mint `token-1`, `token-2`, ...; requests answer from queued
/// one-shot responses first, then from sticky routes, else 404.
#[derive(Clone, Default)]
pub struct FakeTransport {
    inner: Arc<Inner>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every `method path` with `body`.
    pub fn respond(&self, method: Method, path: impl Into<String>, body: Value) {
        self.inner.routes.lock().expect("mutex poisoned").insert((method, path.into()), Ok(body));
    }

    /// Answer every `method path` with `error`.
    pub fn fail(&self, method: Method, path: impl Into<String>, error: ApiError) {
        self.inner.routes.lock().expect("mutex poisoned").insert((method, path.into()), Err(error));
    }

    /// Queue a single response ahead of the sticky route.
    pub fn respond_once(
        &self,
        method: Method,
        path: impl Into<String>,
        result: Result<Value, ApiError>,
    ) {
        self.inner
            .once
            .lock()
            .expect("mutex poisoned")
            .entry((method, path.into()))
            .or_default()
            .push_back(result);
    }

    /// Make the next login fail.
    pub fn fail_login(&self, error: ApiError) {
        self.inner.login_failures.lock().expect("mutex poisoned").push_back(error);
    }

    pub fn login_calls(&self) -> u32 {
        self.inner.login_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<FakeRequest> {
        self.inner.requests.lock().expect("mutex poisoned").clone()
    }
}

#[async_trait]
impl ApiTransport for FakeTransport {
    async fn authenticate(&self, _credentials: &Credentials) -> Result<String, ApiError> {
        let n = self.inner.login_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(error) = self.inner.login_failures.lock().expect("mutex poisoned").pop_front() {
            return Err(error);
        }
        Ok(format!("token-{n}"))
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        self.inner.requests.lock().expect("mutex poisoned").push(FakeRequest {
            method,
            path: path.to_string(),
            token: token.to_string(),
            body: body.cloned(),
        });
        let route = (method, path.to_string());
        let queued = self
            .inner
            .once
            .lock()
            .expect("mutex poisoned")
            .get_mut(&route)
            .and_then(VecDeque::pop_front);
        if let Some(result) = queued {
            return result;
        }
        self.inner
            .routes
            .lock()
            .expect("mutex poisoned")
            .get(&route)
            .cloned()
            .unwrap_or_else(|| Err(ApiError::from_status(404, "no such route", None)))
    }
}

/// Route the demo bank's endpoints. Balances match the scripted web site.
pub fn demo_api(transport: &FakeTransport) {
    transport.respond(
        Method::Get,
        "/api/account",
        json!({"Accounts": [
            {"Name": "800002 Savings", "id": "800002"},
            {"Name": "800003 Checking", "id": "800003"},
        ]}),
    );
    transport.respond(
        Method::Get,
        "/api/account/800002",
        json!({"accountId": "800002", "accountName": "800002 Savings", "accountType": "Savings",
               "balance": "$10,000.00", "availableBalance": "$10,000.00"}),
    );
    transport.respond(
        Method::Get,
        "/api/account/800003",
        json!({"accountId": "800003", "accountName": "800003 Checking", "accountType": "Checking",
               "balance": "$2,500.00", "availableBalance": "$2,400.00"}),
    );
    let history = [
        ("800002", json!([
            {"transactionId": "2301", "date": "2025-03-04", "description": "Deposit",
             "credit": "$200.00", "debit": "$0.00", "amount": "$200.00"},
            {"transactionId": "2304", "date": "2025-03-07", "description": "Deposit",
             "credit": "$99.99", "debit": "$0.00", "amount": "$99.99"},
        ])),
        ("800003", json!([
            {"transactionId": "2302", "date": "2025-03-05", "description": "Withdrawal",
             "credit": "$0.00", "debit": "$125.50", "amount": "-$125.50"},
            {"transactionId": "2303", "date": "2025-03-06", "description": "Deposit",
             "credit": "$150.00", "debit": "$0.00", "amount": "$150.00"},
        ])),
    ];
    for (id, txns) in history {
        let path = format!("/api/account/{id}/transactions");
        transport.respond(Method::Post, path.clone(), json!({"transactions": txns.clone()}));
        transport.respond(Method::Get, path, json!({"lastTenTransactions": txns}));
    }
}
