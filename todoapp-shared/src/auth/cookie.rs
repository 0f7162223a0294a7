//! Session cookie shaping and parsing
//!
//! [`SessionCookie`] renders a `Set-Cookie` value; [`cookie_value`] pulls a
//! named cookie out of a request's `Cookie` headers.
//!
//! ```
//! use chrono::{Duration, Utc};
//! use todoapp_shared::auth::cookie::{CookieConfig, SessionCookie};
//!
//! let config = CookieConfig::default();
//! let cookie = SessionCookie::new(&config, "abc".to_string(), Utc::now() + Duration::days(1));
//! let header = cookie.to_string();
//!
//! assert!(header.starts_with("token=abc; Path=/; Expires="));
//! assert!(header.contains("HttpOnly; Secure; SameSite=Lax"));
//! ```

use std::fmt;
use std::str::FromStr;

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};

/// Cookie name used when none is configured
pub const DEFAULT_COOKIE_NAME: &str = "token";

/// `SameSite` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    #[default]
    Lax,
    Strict,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

impl FromStr for SameSite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "none" => Ok(SameSite::None),
            other => Err(format!("unknown SameSite value '{other}'")),
        }
    }
}

/// Attributes shared by every session cookie the server sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub same_site: SameSite,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            secure: true,
            same_site: SameSite::Lax,
        }
    }
}

/// A `Set-Cookie` value carrying (or clearing) a session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub expires: DateTime<Utc>,
    /// Seconds until expiry; 0 tells the client to drop the cookie
    pub max_age: i64,
    pub secure: bool,
    pub same_site: SameSite,
}

impl SessionCookie {
    pub fn new(config: &CookieConfig, value: String, expires: DateTime<Utc>) -> Self {
        let max_age = (expires - Utc::now()).num_seconds().max(0);
        Self {
            name: config.name.clone(),
            value,
            expires,
            max_age,
            secure: config.secure,
            same_site: config.same_site,
        }
    }

    /// A cookie that overwrites and expires the client's token
    pub fn removal(config: &CookieConfig) -> Self {
        Self {
            name: config.name.clone(),
            value: String::new(),
            expires: DateTime::<Utc>::default(),
            max_age: 0,
            secure: config.secure,
            same_site: config.same_site,
        }
    }
}

impl fmt::Display for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}; Path=/; Expires={}; Max-Age={}; HttpOnly",
            self.name,
            self.value,
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT"),
            self.max_age
        )?;
        if self.secure {
            f.write_str("; Secure")?;
        }
        write!(f, "; SameSite={}", self.same_site.as_str())
    }
}

/// Value of the first cookie called `name` in the request's `Cookie` headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
}

/// Cookie names must be non-empty RFC 6265 tokens
pub fn is_valid_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}
