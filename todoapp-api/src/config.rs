//! Configuration management for the API server
//!
//! Loaded from environment variables; a `.env` file is honored in
//! development.
//!
//! # Environment Variables
//!
//! - `API_HOST` / `API_PORT`: bind address (default `0.0.0.0:8080`)
//! - `DATABASE_URL`: SQLite URL (required)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default 10)
//! - `SESSION_SECRET`: HMAC key for session tokens, at least 32 characters (required)
//! - `SESSION_COOKIE_NAME`, `SESSION_COOKIE_SECURE`, `SESSION_COOKIE_SAME_SITE`
//! - `SESSION_TTL_DAYS`: session lifetime (default 1095)
//! - `STRICT_TARGET_ID`: reject malformed superuser target ids (default true)
//! - `CORS_ORIGINS`: comma-separated origins, `*` for any (default `*`)
//! - `EMAIL_REPLY`: From address for outgoing mail
//! - `PUBLIC_BASE_URL`: base of links put in emails
//! - `RUST_LOG`, `LOG_FORMAT`: read by `main`, not here
//!
//! # Example
//!
//! ```no_run
//! use todoapp_api::config::Config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! println!("Server will listen on {}", config.bind_address());
//! # Ok(())
//! # }
//! ```

use std::env;
use std::str::FromStr;

use chrono::Duration;
use todoapp_shared::auth::cookie::{is_valid_cookie_name, SameSite, DEFAULT_COOKIE_NAME};
use todoapp_shared::auth::identity::TargetPolicy;
use todoapp_shared::auth::session::{SessionConfig, DEFAULT_SESSION_TTL_DAYS};
use todoapp_shared::db::pool::DatabaseConfig;

/// Shortest accepted `SESSION_SECRET`
pub const MIN_SECRET_LEN: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub target_policy: TargetPolicy,
    pub mail: MailConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Outgoing mail settings
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// From address
    pub reply: String,

    /// Prefix of links sent to users, without trailing slash
    pub public_base_url: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from any variable source
    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let host = get("API_HOST", "0.0.0.0");
        let port = parse::<u16>("API_PORT", &get("API_PORT", "8080"))?;
        let cors_origins = get("CORS_ORIGINS", "*")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = parse::<u32>(
            "DATABASE_MAX_CONNECTIONS",
            &get("DATABASE_MAX_CONNECTIONS", "10"),
        )?;

        let secret = var("SESSION_SECRET")
            .ok_or_else(|| anyhow::anyhow!("SESSION_SECRET environment variable is required"))?;
        if secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("SESSION_SECRET must be at least {MIN_SECRET_LEN} characters long");
        }

        let cookie_name = get("SESSION_COOKIE_NAME", DEFAULT_COOKIE_NAME);
        if !is_valid_cookie_name(&cookie_name) {
            anyhow::bail!("SESSION_COOKIE_NAME '{cookie_name}' is not a valid cookie name");
        }

        let mut session = SessionConfig::new(secret);
        session.ttl = Duration::days(parse::<i64>(
            "SESSION_TTL_DAYS",
            &get("SESSION_TTL_DAYS", &DEFAULT_SESSION_TTL_DAYS.to_string()),
        )?);
        session.cookie.name = cookie_name;
        session.cookie.secure = parse::<bool>(
            "SESSION_COOKIE_SECURE",
            &get("SESSION_COOKIE_SECURE", "true"),
        )?;
        session.cookie.same_site =
            SameSite::from_str(&get("SESSION_COOKIE_SAME_SITE", "Lax")).map_err(anyhow::Error::msg)?;

        let target_policy =
            TargetPolicy::from_str(&get("STRICT_TARGET_ID", "true")).map_err(anyhow::Error::msg)?;

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                ..Default::default()
            },
            session,
            target_policy,
            mail: MailConfig {
                reply: get("EMAIL_REPLY", "noreply@localhost"),
                public_base_url: get("PUBLIC_BASE_URL", "http://localhost:8080")
                    .trim_end_matches('/')
                    .to_string(),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("{key}: invalid value '{raw}': {e}"))
}
