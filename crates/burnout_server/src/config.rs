//! Server configuration from environment variables.
//!
//!   BURNOUT_DATABASE_URL      : Postgres connection string (required unless --memory)
//!   BURNOUT_JWT_SECRET        : JWT HMAC secret (required)
//!   BURNOUT_BIND_ADDR         : listen address (default: 0.0.0.0:5555)
//!   BURNOUT_TOKEN_TTL_SECS    : access token lifetime (default: 3600)
//!   BURNOUT_CORS_ORIGIN       : allowed browser origin (default: http://localhost:5173)
//!   BURNOUT_DB_MAX_CONNECTIONS: pool size (default: 10)

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub token_ttl_secs: i64,
    pub cors_origin: String,
    pub db_max_connections: u32,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("BURNOUT_JWT_SECRET").context("BURNOUT_JWT_SECRET must be set")?;
        let token_ttl_secs = match get("BURNOUT_TOKEN_TTL_SECS") {
            Some(raw) => raw
                .parse::<i64>()
                .with_context(|| format!("BURNOUT_TOKEN_TTL_SECS is not an integer: {raw}"))?,
            None => 3600,
        };
        let db_max_connections = match get("BURNOUT_DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("BURNOUT_DB_MAX_CONNECTIONS is not an integer: {raw}"))?,
            None => 10,
        };

        Ok(Self {
            database_url: get("BURNOUT_DATABASE_URL"),
            jwt_secret,
            bind_addr: get("BURNOUT_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:5555".into()),
            token_ttl_secs,
            cors_origin: get("BURNOUT_CORS_ORIGIN")
                .unwrap_or_else(|| "http://localhost:5173".into()),
            db_max_connections,
        })
    }
}
