//! Session model
//!
//! Rows are created by [`SessionManager`](crate::auth::session::SessionManager);
//! this module only declares the shape and the device-list view.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE sessions (
//!     id BLOB PRIMARY KEY NOT NULL,
//!     account_id BLOB NOT NULL,
//!     token TEXT NOT NULL,
//!     client_info TEXT NOT NULL DEFAULT '',
//!     expires_at TEXT NOT NULL,
//!     created_at TEXT NOT NULL,
//!     deleted_at TEXT
//! );
//! CREATE UNIQUE INDEX sessions_token ON sessions (token);
//! CREATE INDEX sessions_account ON sessions (account_id);
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::store::filter::Value;
use crate::store::record::{Fields, Projection, Record};

/// A login session
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub account_id: Uuid,
    /// Bearer token, as sent in the session cookie
    pub token: String,
    /// User-Agent seen at login
    pub client_info: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl Projection for Session {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "account_id",
        "token",
        "client_info",
        "expires_at",
        "created_at",
    ];
}

impl Fields for Session {
    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("account_id", self.account_id.into()),
            ("token", self.token.clone().into()),
            ("client_info", self.client_info.clone().into()),
            ("expires_at", self.expires_at.into()),
            ("created_at", self.created_at.into()),
        ]
    }
}

impl Record for Session {
    const TABLE: &'static str = "sessions";
    const SCHEMA: &'static [&'static str] = &[
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id BLOB PRIMARY KEY NOT NULL,
            account_id BLOB NOT NULL,
            token TEXT NOT NULL,
            client_info TEXT NOT NULL DEFAULT '',
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            deleted_at TEXT
        )
        "#,
        "CREATE UNIQUE INDEX IF NOT EXISTS sessions_token ON sessions (token)",
        "CREATE INDEX IF NOT EXISTS sessions_account ON sessions (account_id)",
    ];
}

/// A session as shown in the device list; never carries the token
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SessionView {
    pub id: Uuid,
    pub client_info: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Projection for SessionView {
    const COLUMNS: &'static [&'static str] = &["id", "client_info", "expires_at", "created_at"];
}
