//! Session lifecycle
//!
//! ```text
//! create ──▶ active ──▶ revoked   (logout, "close other sessions",
//!                                  or expiry noticed on read)
//! ```
//!
//! Tokens are minted by [`generate_token`] and checked with
//! [`verify_token_format`] before any store lookup, so garbage cookies never
//! cost a query.

use std::fmt;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::cookie::{CookieConfig, SessionCookie};
use super::token::{generate_token, verify_token_format};
use crate::error::{Error, Result};
use crate::models::session::{Session, SessionView};
use crate::store::filter::{FilterMap, Order};
use crate::store::RecordStore;

/// Default session lifetime: three years
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 3 * 365;

/// Settings for [`SessionManager`]
#[derive(Clone)]
pub struct SessionConfig {
    /// HMAC key for session tokens
    pub secret: Vec<u8>,
    pub ttl: Duration,
    pub cookie: CookieConfig,
}

impl SessionConfig {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::days(DEFAULT_SESSION_TTL_DAYS),
            cookie: CookieConfig::default(),
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .field("cookie", &self.cookie)
            .finish()
    }
}

/// Creates, validates and revokes sessions
#[derive(Clone)]
pub struct SessionManager {
    store: RecordStore,
    secret: Arc<[u8]>,
    ttl: Duration,
    cookie: CookieConfig,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .field("cookie", &self.cookie)
            .finish_non_exhaustive()
    }
}

fn by_token(token: &str) -> FilterMap {
    FilterMap::new().eq("token", token)
}

impl SessionManager {
    pub fn new(store: RecordStore, config: SessionConfig) -> Self {
        Self {
            store,
            secret: config.secret.into(),
            ttl: config.ttl,
            cookie: config.cookie,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie.name
    }

    /// Starts a session for `account_id`
    ///
    /// `client_info` is whatever identifies the device (the User-Agent).
    pub async fn create(
        &self,
        account_id: Uuid,
        client_info: &str,
    ) -> Result<(Session, SessionCookie)> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            account_id,
            token: generate_token(&self.secret)?,
            client_info: client_info.to_string(),
            expires_at: now + self.ttl,
            created_at: now,
        };

        self.store.create(&session).await?;
        info!(
            session_id = %session.id,
            account_id = %account_id,
            expires_at = %session.expires_at,
            "Session created"
        );

        let cookie = SessionCookie::new(&self.cookie, session.token.clone(), session.expires_at);
        Ok((session, cookie))
    }

    /// Looks up a live session by token
    ///
    /// # Errors
    ///
    /// `Unauthorized` for a malformed or forged token, an unknown token, or
    /// an expired session (which is revoked on the way out).
    pub async fn read(&self, token: &str) -> Result<Session> {
        if !verify_token_format(&self.secret, token) {
            warn!("Rejected malformed session token");
            return Err(Error::unauthorized("invalid session token"));
        }

        let session: Session = match self.store.read_one(&by_token(token)).await {
            Ok(session) => session,
            Err(Error::NotFound) => {
                debug!("Session token not found");
                return Err(Error::unauthorized("session not found"));
            }
            Err(e) => return Err(e),
        };

        if session.is_expired(Utc::now()) {
            warn!(session_id = %session.id, "Expired session presented, revoking");
            match self.store.delete::<Session>(&by_token(token)).await {
                Ok(_) | Err(Error::NotFound) => {}
                Err(e) => return Err(e),
            }
            return Err(Error::unauthorized("session expired"));
        }

        Ok(session)
    }

    /// Device list for an account, newest first
    pub async fn read_all(&self, account_id: Uuid) -> Result<Vec<SessionView>> {
        let filter = FilterMap::new()
            .eq("account_id", account_id)
            .order_by("created_at", Order::Desc);
        self.store
            .read_many_as::<Session, SessionView>(&filter)
            .await
    }

    /// Revokes exactly the session holding `token`
    pub async fn delete(&self, token: &str) -> Result<()> {
        self.store.delete::<Session>(&by_token(token)).await?;
        info!("Session revoked");
        Ok(())
    }

    /// Revokes every session of `account_id` except the one holding `token`
    ///
    /// `NotFound` when there was nothing else to revoke.
    pub async fn delete_all_except_one(&self, account_id: Uuid, token: &str) -> Result<u64> {
        let revoked = self
            .store
            .delete_all_except_one::<Session>(
                &FilterMap::new().eq("account_id", account_id),
                "token",
                token,
            )
            .await?;
        info!(account_id = %account_id, revoked, "Other sessions revoked");
        Ok(revoked)
    }

    /// Revokes every session of `account_id`
    pub async fn delete_all(&self, account_id: Uuid) -> Result<u64> {
        let revoked = self
            .store
            .delete::<Session>(&FilterMap::new().eq("account_id", account_id))
            .await?;
        info!(account_id = %account_id, revoked, "All sessions revoked");
        Ok(revoked)
    }

    /// Cookie that clears the client's token
    pub fn removal_cookie(&self) -> SessionCookie {
        SessionCookie::removal(&self.cookie)
    }
}
