//! Account model and operations
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE accounts (
//!     id BLOB PRIMARY KEY NOT NULL,
//!     email TEXT NOT NULL,
//!     username TEXT NOT NULL DEFAULT '',
//!     name TEXT NOT NULL DEFAULT '',
//!     surname TEXT NOT NULL DEFAULT '',
//!     password_hash TEXT NOT NULL,
//!     email_verification_key TEXT,
//!     email_key_created_at TEXT,
//!     email_verified INTEGER NOT NULL DEFAULT 0,
//!     is_superuser INTEGER NOT NULL DEFAULT 0,
//!     created_at TEXT NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     deleted_at TEXT
//! );
//! -- email is unique among live accounts only
//! CREATE UNIQUE INDEX accounts_email_live ON accounts (email) WHERE deleted_at IS NULL;
//! ```
//!
//! # Example
//!
//! ```no_run
//! use todoapp_shared::models::account::{Account, NewAccount};
//! # use todoapp_shared::store::RecordStore;
//!
//! # async fn example(store: RecordStore) -> todoapp_shared::error::Result<()> {
//! let account = Account::create(&store, NewAccount {
//!     email: "User@Example.com ".to_string(),
//!     password: "correct horse battery".to_string(),
//!     ..Default::default()
//! }).await?;
//!
//! assert_eq!(account.email, "user@example.com");
//! assert!(!account.email_verified);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, validate_credentials, validate_password};
use crate::auth::token::generate_verification_key;
use crate::error::{Error, Result};
use crate::store::filter::{FilterMap, Value};
use crate::store::record::{Fields, Projection, Record};
use crate::store::RecordStore;

/// How long an email verification key stays usable
pub const VERIFICATION_KEY_TTL_HOURS: i64 = 24;

/// A user account
///
/// Serializes without the password hash or verification key.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,

    /// Lower-cased and trimmed; unique among live accounts
    pub email: String,

    pub username: String,
    pub name: String,
    pub surname: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    #[serde(skip_serializing)]
    pub email_verification_key: Option<String>,

    #[serde(skip_serializing)]
    pub email_key_created_at: Option<DateTime<Utc>>,

    pub email_verified: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Projection for Account {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "email",
        "username",
        "name",
        "surname",
        "password_hash",
        "email_verification_key",
        "email_key_created_at",
        "email_verified",
        "is_superuser",
        "created_at",
        "updated_at",
    ];
}

impl Fields for Account {
    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("email", self.email.clone().into()),
            ("username", self.username.clone().into()),
            ("name", self.name.clone().into()),
            ("surname", self.surname.clone().into()),
            ("password_hash", self.password_hash.clone().into()),
            ("email_verification_key", self.email_verification_key.clone().into()),
            ("email_key_created_at", self.email_key_created_at.into()),
            ("email_verified", self.email_verified.into()),
            ("is_superuser", self.is_superuser.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}

impl Record for Account {
    const TABLE: &'static str = "accounts";
    const SCHEMA: &'static [&'static str] = &[
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id BLOB PRIMARY KEY NOT NULL,
            email TEXT NOT NULL,
            username TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL DEFAULT '',
            surname TEXT NOT NULL DEFAULT '',
            password_hash TEXT NOT NULL,
            email_verification_key TEXT,
            email_key_created_at TEXT,
            email_verified INTEGER NOT NULL DEFAULT 0,
            is_superuser INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        )
        "#,
        "CREATE UNIQUE INDEX IF NOT EXISTS accounts_email_live ON accounts (email) WHERE deleted_at IS NULL",
        "CREATE INDEX IF NOT EXISTS accounts_verification_key ON accounts (email_verification_key)",
    ];
}

/// The caller's own summary, as returned by `/auth/me`
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MeView {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub email_verified: bool,
    pub is_superuser: bool,
}

impl Projection for MeView {
    const COLUMNS: &'static [&'static str] =
        &["id", "email", "username", "email_verified", "is_superuser"];
}

/// Signup input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
}

/// Profile changes; empty strings leave the column untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountPatch {
    pub email: String,
    pub username: String,
    pub name: String,
    pub surname: String,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_empty()
            && self.username.is_empty()
            && self.name.is_empty()
            && self.surname.is_empty()
    }
}

impl Fields for AccountPatch {
    fn fields(&self) -> Vec<(&'static str, Value)> {
        let mut fields = vec![
            ("email", normalize_email(&self.email).into()),
            ("username", self.username.clone().into()),
            ("name", self.name.clone().into()),
            ("surname", self.surname.clone().into()),
        ];
        if !self.is_empty() {
            fields.push(("updated_at", Utc::now().into()));
        }
        fields
    }
}

struct PasswordChange {
    password_hash: String,
}

impl Fields for PasswordChange {
    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("password_hash", self.password_hash.clone().into()),
            ("updated_at", Utc::now().into()),
        ]
    }
}

/// Verification state; written whole so `false`/NULL are stored too
struct VerificationState {
    verified: bool,
    key: Option<String>,
    key_created_at: Option<DateTime<Utc>>,
}

impl Fields for VerificationState {
    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("email_verified", self.verified.into()),
            ("email_verification_key", self.key.clone().into()),
            ("email_key_created_at", self.key_created_at.into()),
            ("updated_at", Utc::now().into()),
        ]
    }
}

/// Result of presenting a verification key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    /// The key matched but is older than [`VERIFICATION_KEY_TTL_HOURS`]
    Expired,
}

/// Lower-cases and trims an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn by_id(id: Uuid) -> FilterMap {
    FilterMap::new().eq("id", id)
}

impl Account {
    /// Registers a new account
    ///
    /// Validates and normalizes the email, hashes the password and issues a
    /// verification key.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed email or password
    /// - `Conflict` when a live account already uses the email
    pub async fn create(store: &RecordStore, data: NewAccount) -> Result<Self> {
        validate_credentials(&data.email, &data.password).map_err(Error::Validation)?;
        let email = normalize_email(&data.email);

        // Check first for a readable conflict; the unique index still guards
        // concurrent signups
        match Self::find_by_email(store, &email).await {
            Ok(_) => return Err(Error::Conflict("email already registered".to_string())),
            Err(Error::NotFound) => {}
            Err(e) => return Err(e),
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            email,
            username: data.username.trim().to_string(),
            name: data.name.trim().to_string(),
            surname: data.surname.trim().to_string(),
            password_hash: hash_password(&data.password)?,
            email_verification_key: Some(generate_verification_key()?),
            email_key_created_at: Some(now),
            email_verified: false,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        };

        store.create(&account).await?;
        info!(account_id = %account.id, "Account created");
        Ok(account)
    }

    pub async fn find_by_id(store: &RecordStore, id: Uuid) -> Result<Self> {
        store.read_one(&by_id(id)).await
    }

    pub async fn find_by_email(store: &RecordStore, email: &str) -> Result<Self> {
        store
            .read_one(&FilterMap::new().eq("email", normalize_email(email)))
            .await
    }

    /// Reads the `/auth/me` projection
    pub async fn me(store: &RecordStore, id: Uuid) -> Result<MeView> {
        store.read_one_as::<Account, MeView>(&by_id(id)).await
    }

    /// Applies a profile patch
    ///
    /// Changing the email resets verification; the new key is returned so
    /// the caller can mail it.
    pub async fn update_profile(
        store: &RecordStore,
        id: Uuid,
        patch: &AccountPatch,
    ) -> Result<Option<String>> {
        if !patch.email.is_empty() && !patch.email.contains('@') {
            return Err(Error::validation("email is not a valid address"));
        }

        store.update_whole::<Account, _>(&by_id(id), patch).await?;

        if patch.email.is_empty() {
            Ok(None)
        } else {
            Self::regenerate_verification_key(store, id).await.map(Some)
        }
    }

    /// Replaces the password hash
    pub async fn change_password(store: &RecordStore, id: Uuid, password: &str) -> Result<()> {
        validate_password(password).map_err(Error::Validation)?;

        let change = PasswordChange {
            password_hash: hash_password(password)?,
        };
        store.update_submodel::<Account, _>(&by_id(id), &change).await?;
        info!(account_id = %id, "Password changed");
        Ok(())
    }

    /// Marks the account owning `key` as verified and consumes the key
    ///
    /// # Errors
    ///
    /// `NotFound` when no live account holds the key.
    pub async fn verify_email(store: &RecordStore, key: &str) -> Result<VerifyOutcome> {
        if key.is_empty() {
            return Err(Error::NotFound);
        }

        let account: Account = store
            .read_one(&FilterMap::new().eq("email_verification_key", key))
            .await?;

        if account.verification_key_expired(Utc::now()) {
            warn!(account_id = %account.id, "Expired verification key presented");
            return Ok(VerifyOutcome::Expired);
        }

        let state = VerificationState {
            verified: true,
            key: None,
            key_created_at: None,
        };
        store
            .update_submodel::<Account, _>(&by_id(account.id), &state)
            .await?;

        info!(account_id = %account.id, "Email verified");
        Ok(VerifyOutcome::Verified)
    }

    /// Issues a fresh verification key and clears the verified flag
    pub async fn regenerate_verification_key(store: &RecordStore, id: Uuid) -> Result<String> {
        let key = generate_verification_key()?;
        let state = VerificationState {
            verified: false,
            key: Some(key.clone()),
            key_created_at: Some(Utc::now()),
        };
        store.update_submodel::<Account, _>(&by_id(id), &state).await?;
        Ok(key)
    }

    /// Soft-deletes the account
    pub async fn delete(store: &RecordStore, id: Uuid) -> Result<()> {
        store.delete::<Account>(&by_id(id)).await?;
        info!(account_id = %id, "Account deleted");
        Ok(())
    }

    /// Grants or revokes superuser rights
    pub async fn set_superuser(store: &RecordStore, id: Uuid, is_superuser: bool) -> Result<()> {
        struct Flag(bool);
        impl Fields for Flag {
            fn fields(&self) -> Vec<(&'static str, Value)> {
                vec![("is_superuser", self.0.into())]
            }
        }

        store
            .update_submodel::<Account, _>(&by_id(id), &Flag(is_superuser))
            .await?;
        Ok(())
    }

    /// True when the verification key is older than its TTL
    pub fn verification_key_expired(&self, now: DateTime<Utc>) -> bool {
        match self.email_key_created_at {
            Some(created) => now - created > Duration::hours(VERIFICATION_KEY_TTL_HOURS),
            None => true,
        }
    }
}
