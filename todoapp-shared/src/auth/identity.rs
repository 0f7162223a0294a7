//! Caller resolution
//!
//! Turns the session cookie of a request into an [`AuthContext`]: who is
//! calling, and on whose behalf. A superuser may act on another account by
//! naming its id (typically a path parameter); everyone else always acts as
//! themselves.
//!
//! # Example
//!
//! ```no_run
//! use axum::http::HeaderMap;
//! use todoapp_shared::auth::identity::IdentityResolver;
//!
//! # async fn example(resolver: IdentityResolver, headers: HeaderMap) -> todoapp_shared::error::Result<()> {
//! let ctx = resolver.resolve(&headers, Some("0b4e7a0e-5d2f-4c1b-9d7e-3f1a2b3c4d5e")).await?;
//! if ctx.is_superuser {
//!     // ctx.account_id is the target account
//! } else {
//!     assert_eq!(ctx.account_id, ctx.caller_id);
//! }
//! # Ok(())
//! # }
//! ```

use std::str::FromStr;

use axum::http::HeaderMap;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::cookie::cookie_value;
use super::session::SessionManager;
use crate::error::{Error, Result};
use crate::models::account::Account;
use crate::store::RecordStore;

/// What to do with a superuser's target id that is not a UUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetPolicy {
    /// Reject the request with a validation error
    #[default]
    Strict,
    /// Ignore the id; the caller acts as themselves
    Lenient,
}

impl FromStr for TargetPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" | "true" | "1" => Ok(TargetPolicy::Strict),
            "lenient" | "false" | "0" => Ok(TargetPolicy::Lenient),
            other => Err(format!("unknown target policy '{other}'")),
        }
    }
}

/// Resolved identity of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    /// Account the request acts on
    pub account_id: Uuid,
    /// Account that owns the session
    pub caller_id: Uuid,
    pub is_superuser: bool,
    pub session_id: Uuid,
    /// Session token, needed to log out or close other sessions
    #[serde(skip_serializing)]
    pub token: String,
}

impl AuthContext {
    /// True when a superuser is acting on someone else's account
    pub fn is_acting_as_other(&self) -> bool {
        self.account_id != self.caller_id
    }
}

/// Resolves request identities
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    sessions: SessionManager,
    store: RecordStore,
    policy: TargetPolicy,
}

impl IdentityResolver {
    pub fn new(sessions: SessionManager, store: RecordStore, policy: TargetPolicy) -> Self {
        Self {
            sessions,
            store,
            policy,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Resolves the caller from the request's cookies
    ///
    /// # Errors
    ///
    /// - `Unauthorized`: no cookie, bad or expired session, or the session's
    ///   account no longer exists
    /// - `Validation`: a superuser passed a malformed target id under
    ///   [`TargetPolicy::Strict`]
    /// - `Store`: the account lookup failed for another reason
    pub async fn resolve(&self, headers: &HeaderMap, target_id: Option<&str>) -> Result<AuthContext> {
        let token = cookie_value(headers, self.sessions.cookie_name())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::unauthorized("missing session cookie"))?;

        let session = self.sessions.read(&token).await?;

        let account = match Account::find_by_id(&self.store, session.account_id).await {
            Ok(account) => account,
            Err(Error::NotFound) => {
                warn!(session_id = %session.id, "Session belongs to a missing account");
                return Err(Error::unauthorized("account no longer exists"));
            }
            Err(e) => return Err(e),
        };

        let account_id = if account.is_superuser {
            self.target(account.id, target_id)?
        } else {
            account.id
        };

        if account_id != account.id {
            debug!(caller_id = %account.id, target_id = %account_id, "Superuser override");
        }

        Ok(AuthContext {
            account_id,
            caller_id: account.id,
            is_superuser: account.is_superuser,
            session_id: session.id,
            token,
        })
    }

    fn target(&self, caller_id: Uuid, target_id: Option<&str>) -> Result<Uuid> {
        let Some(raw) = target_id else {
            return Ok(caller_id);
        };

        match (Uuid::parse_str(raw), self.policy) {
            (Ok(id), _) => Ok(id),
            (Err(_), TargetPolicy::Strict) => {
                Err(Error::validation(format!("'{raw}' is not a valid account id")))
            }
            (Err(_), TargetPolicy::Lenient) => {
                debug!(target_id = raw, "Ignoring malformed target id");
                Ok(caller_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_policy_parsing() {
        assert_eq!("strict".parse::<TargetPolicy>(), Ok(TargetPolicy::Strict));
        assert_eq!("true".parse::<TargetPolicy>(), Ok(TargetPolicy::Strict));
        assert_eq!("Lenient".parse::<TargetPolicy>(), Ok(TargetPolicy::Lenient));
        assert_eq!("false".parse::<TargetPolicy>(), Ok(TargetPolicy::Lenient));
        assert!("maybe".parse::<TargetPolicy>().is_err());
        assert_eq!(TargetPolicy::default(), TargetPolicy::Strict);
    }

    #[test]
    fn test_acting_as_other() {
        let caller = Uuid::new_v4();
        let mut ctx = AuthContext {
            account_id: caller,
            caller_id: caller,
            is_superuser: true,
            session_id: Uuid::new_v4(),
            token: String::new(),
        };
        assert!(!ctx.is_acting_as_other());

        ctx.account_id = Uuid::new_v4();
        assert!(ctx.is_acting_as_other());
    }
}
