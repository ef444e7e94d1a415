//! Common test utilities
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;

use bank_api::api::{build_app, AppState};
use bank_api::auth::{PasswordService, TokenService};
use bank_api::config::SigningSecret;
use bank_api::domain::{AccountId, AccountNumber};
use bank_api::store::{InMemoryStorage, Storage};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_PASSWORD: &str = "correct horse";

/// Full router over an in-memory store, with cheap Argon2 parameters
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStorage>,
    pub tokens: TokenService,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStorage::new());
        let tokens = TokenService::new(SigningSecret::new(TEST_SECRET), Duration::minutes(10));
        let passwords = PasswordService::with_params(1024, 1, 1).expect("valid argon2 params");

        let state = AppState::new(store.clone(), passwords, tokens.clone());

        Self {
            router: build_app(state),
            store,
            tokens,
        }
    }

    /// Send a request and return the status with the body parsed as JSON
    /// (non-JSON bodies come back as a JSON string).
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, token);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    /// Create an account over HTTP; returns the response body
    pub async fn create_account(&self, first_name: &str, last_name: &str) -> Value {
        let (status, body) = self
            .send(
                "POST",
                "/account",
                None,
                Some(serde_json::json!({
                    "firstName": first_name,
                    "lastName": last_name,
                    "password": TEST_PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "account creation failed: {}", body);
        body
    }

    /// Log in over HTTP; returns the token
    pub async fn login(&self, number: AccountNumber) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/login",
                None,
                Some(serde_json::json!({ "number": number, "password": TEST_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    /// Put money into an account directly through the store
    pub async fn fund(&self, id: AccountId, amount: i64) {
        self.store.update_balance(id, amount).await.unwrap();
    }

    pub async fn balance_of(&self, id: AccountId) -> i64 {
        self.store.get_by_id(id).await.unwrap().balance
    }
}

/// Account id and number from an account response body
pub fn ids(account: &Value) -> (AccountId, AccountNumber) {
    (
        account["id"].as_i64().unwrap(),
        account["number"].as_i64().unwrap(),
    )
}
