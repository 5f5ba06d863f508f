//! Application settings loaded via OrthoConfig.
//!
//! Every value can come from the command line, the environment (`LOANS_`
//! prefix) or a configuration file. Accessors apply the defaults so the rest
//! of the crate never sees a missing value.

use std::net::SocketAddr;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::outbound::security::MIN_SECRET_LEN;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 168;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Invalid or missing settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("bind address `{value}` is not a socket address")]
    InvalidBindAddr { value: String },
    #[error("LOANS_JWT_SECRET must be set in release builds")]
    MissingJwtSecret,
    #[error("jwt secret must be at least {MIN_SECRET_LEN} bytes")]
    ShortJwtSecret,
    #[error("token lifetime must be a positive number of hours, got {hours}")]
    InvalidTokenTtl { hours: i64 },
    #[error("database pool needs at least one connection")]
    EmptyPool,
}

/// Runtime configuration for the HTTP server and the admin tooling.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LOANS")]
pub struct AppSettings {
    /// Listen address.
    #[ortho_config(default = "0.0.0.0:5000".to_owned())]
    pub bind_addr: String,
    /// PostgreSQL URL. In-memory stores are used when unset.
    pub database_url: Option<String>,
    /// HS256 signing secret.
    pub jwt_secret: Option<String>,
    /// Bearer token lifetime in hours.
    pub token_ttl_hours: Option<i64>,
    /// Upper bound for pooled database connections.
    pub db_max_connections: Option<u32>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_owned(),
            database_url: None,
            jwt_secret: None,
            token_ttl_hours: None,
            db_max_connections: None,
        }
    }
}

impl AppSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.trim();
        raw.parse().map_err(|_| SettingsError::InvalidBindAddr {
            value: raw.to_owned(),
        })
    }

    /// Configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn token_ttl(&self) -> Result<TimeDelta, SettingsError> {
        let hours = self.token_ttl_hours.unwrap_or(DEFAULT_TOKEN_TTL_HOURS);
        if hours <= 0 {
            return Err(SettingsError::InvalidTokenTtl { hours });
        }
        TimeDelta::try_hours(hours).ok_or(SettingsError::InvalidTokenTtl { hours })
    }

    pub fn db_max_connections(&self) -> Result<u32, SettingsError> {
        match self.db_max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS) {
            0 => Err(SettingsError::EmptyPool),
            n => Ok(n),
        }
    }

    /// Signing secret for bearer tokens.
    ///
    /// Debug builds fall back to a random per-process secret, so tokens do
    /// not survive a restart.
    pub fn signing_secret(&self) -> Result<Vec<u8>, SettingsError> {
        resolve_secret(self.jwt_secret.as_deref(), cfg!(debug_assertions))
    }
}

fn resolve_secret(configured: Option<&str>, allow_ephemeral: bool) -> Result<Vec<u8>, SettingsError> {
    match configured.filter(|secret| !secret.is_empty()) {
        Some(secret) if secret.len() < MIN_SECRET_LEN => Err(SettingsError::ShortJwtSecret),
        Some(secret) => Ok(secret.as_bytes().to_vec()),
        None if allow_ephemeral => {
            warn!("LOANS_JWT_SECRET is unset; using an ephemeral signing secret (dev only)");
            Ok(rand::random::<[u8; MIN_SECRET_LEN]>().to_vec())
        }
        None => Err(SettingsError::MissingJwtSecret),
    }
}
