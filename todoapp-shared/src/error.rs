//! Error taxonomy shared by the store, session and identity layers
//!
//! Callers branch on the variant, never on the message text. The request
//! layer maps each variant to a transport status:
//!
//! | variant | meaning |
//! |---|---|
//! | `NotFound` | zero rows matched a read, update or delete |
//! | `Conflict` | unique-constraint violation (duplicate email, token) |
//! | `Unauthorized` | missing, invalid or expired session |
//! | `Validation` | malformed input rejected before reaching the store |
//! | `Token`, `Password` | RNG, MAC or Argon2 failure |
//! | `Store` | anything else the database reported |
//!
//! # Example
//!
//! ```
//! use todoapp_shared::error::Error;
//!
//! fn describe(err: &Error) -> &'static str {
//!     match err {
//!         Error::NotFound => "no content",
//!         Error::Conflict(_) => "already exists",
//!         _ => "failed",
//!     }
//! }
//!
//! assert_eq!(describe(&Error::NotFound), "no content");
//! ```

use crate::auth::password::PasswordError;

/// Result alias used across the shared crate
pub type Result<T> = std::result::Result<T, Error>;

/// Shared error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Zero rows matched the filter
    #[error("Record not found")]
    NotFound,

    /// A unique constraint was violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing, invalid or expired session
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Input rejected before any query was built
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Token minting failed (RNG or MAC initialisation)
    #[error("Token error: {0}")]
    Token(String),

    /// Password hashing or hash parsing failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Any other database failure
    #[error("Store error: {0}")]
    Store(sqlx::Error),
}

impl Error {
    /// Shorthand for a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Shorthand for an unauthorized error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Error::Unauthorized(msg.into())
    }

    /// True for the zero-rows condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

/// Classifies database errors
///
/// Unique violations become `Conflict` carrying the constraint (or message)
/// so callers can tell a duplicate email from a duplicate token.
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let detail = db_err
                    .constraint()
                    .map(str::to_string)
                    .unwrap_or_else(|| db_err.message().to_string());
                Error::Conflict(detail)
            }
            other => Error::Store(other),
        }
    }
}
