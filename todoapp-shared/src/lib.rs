//! # todoapp shared library
//!
//! Data access, domain models and authentication used by the todoapp API.
//!
//! ## Module Organization
//!
//! - `store`: generic record store and filter maps
//! - `db`: connection pool and schema bootstrap
//! - `models`: accounts, sessions, todo lists, tasks
//! - `auth`: passwords, session tokens, cookies, caller resolution
//! - `mail`: outbound email
//! - `error`: shared error type

pub mod auth;
pub mod db;
pub mod error;
pub mod mail;
pub mod models;
pub mod store;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
