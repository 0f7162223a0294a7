//! Shared helpers for the store, session and identity tests
//!
//! Every test gets its own in-memory database, so tests never see each
//! other's rows and need no external service.

#![allow(dead_code)]

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::Duration;
use todoapp_shared::auth::session::{SessionConfig, SessionManager};
use todoapp_shared::db::pool::{create_pool, DatabaseConfig};
use todoapp_shared::db::schema::ensure_schema;
use todoapp_shared::models::account::{Account, NewAccount};
use todoapp_shared::store::RecordStore;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Fresh in-memory store with every table created
pub async fn store() -> RecordStore {
    let pool = create_pool(DatabaseConfig::in_memory())
        .await
        .expect("in-memory pool");
    let store = RecordStore::new(pool);
    ensure_schema(&store).await.expect("schema");
    store
}

pub fn sessions(store: &RecordStore) -> SessionManager {
    SessionManager::new(store.clone(), SessionConfig::new(SECRET))
}

/// Session manager whose sessions are born expired
pub fn expired_sessions(store: &RecordStore) -> SessionManager {
    let mut config = SessionConfig::new(SECRET);
    config.ttl = Duration::seconds(-1);
    SessionManager::new(store.clone(), config)
}

pub async fn account(store: &RecordStore, email: &str) -> Account {
    Account::create(
        store,
        NewAccount {
            email: email.to_string(),
            password: "correct horse battery".to_string(),
            username: email.split('@').next().unwrap_or_default().to_string(),
            ..Default::default()
        },
    )
    .await
    .expect("account")
}

pub async fn superuser(store: &RecordStore, email: &str) -> Account {
    let mut account = account(store, email).await;
    Account::set_superuser(store, account.id, true)
        .await
        .expect("promote");
    account.is_superuser = true;
    account
}

/// Request headers carrying a session cookie
pub fn cookie_headers(name: &str, token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&format!("{name}={token}")).expect("cookie header"),
    );
    headers
}
