//! Authentication
//!
//! # Modules
//!
//! - [`password`]: Argon2id hashing and credential rules
//! - [`token`]: session tokens (random + HMAC) and verification keys
//! - [`cookie`]: `Set-Cookie` shaping and `Cookie` parsing
//! - [`session`]: session lifecycle on top of the record store
//! - [`identity`]: cookie → caller resolution, superuser override
//!
//! # Example
//!
//! ```no_run
//! use todoapp_shared::auth::identity::{IdentityResolver, TargetPolicy};
//! use todoapp_shared::auth::session::{SessionConfig, SessionManager};
//! use todoapp_shared::store::RecordStore;
//!
//! # fn example(store: RecordStore) {
//! let sessions = SessionManager::new(store.clone(), SessionConfig::new("x".repeat(32)));
//! let resolver = IdentityResolver::new(sessions, store, TargetPolicy::Strict);
//! # }
//! ```

pub mod cookie;
pub mod identity;
pub mod password;
pub mod session;
pub mod token;
