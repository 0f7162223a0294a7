//! Common test utilities for the HTTP tests
//!
//! Each [`TestContext`] owns a private in-memory database and a
//! [`MemoryMailer`], so tests run in parallel without external services.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use todoapp_api::app::{build_router, AppState};
use todoapp_api::config::Config;
use todoapp_shared::db::pool::{create_pool, DatabaseConfig};
use todoapp_shared::db::schema::ensure_schema;
use todoapp_shared::mail::MemoryMailer;
use todoapp_shared::models::account::Account;
use todoapp_shared::store::RecordStore;
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "correct horse battery";

/// Status, headers and decoded JSON body (`Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
    }
}

/// Test context containing the router and its collaborators
pub struct TestContext {
    pub app: Router,
    pub store: RecordStore,
    pub mailer: MemoryMailer,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_vars(&[]).await
    }

    /// Context whose configuration overrides the defaults with `vars`
    pub async fn with_vars(vars: &[(&str, &str)]) -> Self {
        let mut map: HashMap<String, String> = HashMap::from([
            ("DATABASE_URL".to_string(), "sqlite::memory:".to_string()),
            (
                "SESSION_SECRET".to_string(),
                "api-test-secret-0123456789abcdef0123".to_string(),
            ),
            ("PUBLIC_BASE_URL".to_string(), "http://todo.test".to_string()),
        ]);
        for (key, value) in vars {
            map.insert(key.to_string(), value.to_string());
        }
        let config = Config::from_vars(|key| map.get(key).cloned()).expect("config");

        let pool = create_pool(DatabaseConfig::in_memory())
            .await
            .expect("in-memory pool");
        let store = RecordStore::new(pool);
        ensure_schema(&store).await.expect("schema");

        let mailer = MemoryMailer::new();
        let state = AppState::new(store.clone(), config, Arc::new(mailer.clone()));

        Self {
            app: build_router(state),
            store,
            mailer,
        }
    }

    /// Sends one request; `cookie` is a `name=value` pair
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(cookie), None).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, cookie, Some(body)).await
    }

    pub async fn put(&self, uri: &str, cookie: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(cookie), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, cookie: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(cookie), None).await
    }

    /// Signs up `email` and returns the new account id
    pub async fn signup(&self, email: &str) -> Uuid {
        let response = self
            .post(
                "/v1/users",
                None,
                json!({ "email": email, "password": PASSWORD, "username": "tester" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"]
            .as_str()
            .and_then(|id| Uuid::parse_str(id).ok())
            .expect("account id")
    }

    /// Logs in and returns the `name=value` cookie pair to send back
    pub async fn login(&self, email: &str) -> String {
        let response = self
            .post(
                "/v1/auth/login",
                None,
                json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        cookie_pair(response.set_cookie().expect("Set-Cookie"))
    }

    /// Signs up and logs in; returns the account id and cookie
    pub async fn user(&self, email: &str) -> (Uuid, String) {
        let id = self.signup(email).await;
        (id, self.login(email).await)
    }

    pub async fn promote(&self, id: Uuid) {
        Account::set_superuser(&self.store, id, true)
            .await
            .expect("promote");
    }

    /// Verification key from the last mail sent to `to`
    pub fn verification_key(&self, to: &str) -> String {
        let mail = self.mailer.last_to(to).expect("verification mail");
        mail.body
            .split_whitespace()
            .find(|word| word.contains("/v1/verify-email/"))
            .and_then(|link| link.rsplit('/').next())
            .expect("verification link")
            .to_string()
    }
}

/// `name=value` part of a `Set-Cookie` header
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
