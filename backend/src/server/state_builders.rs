//! Builders wiring the configured stores into [`HttpState`].

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::ports::{PasswordHasher, TokenCodec, TokenCodecError};
use crate::inbound::http::state::{HttpState, StateDependencies};
use crate::outbound::memory::{InMemoryLoanRepository, InMemoryUserRepository};
use crate::outbound::persistence::{
    DbPool, DieselLoanRepository, DieselUserRepository, MigrationError, PoolConfig, PoolError,
    run_migrations,
};
use crate::outbound::security::{Argon2PasswordHasher, JwtTokenCodec};

use super::config::{AppSettings, SettingsError};

/// Failures while assembling the application.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Migrations(#[from] MigrationError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("token codec: {0}")]
    Tokens(#[from] TokenCodecError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<StartupError> for std::io::Error {
    fn from(err: StartupError) -> Self {
        std::io::Error::other(err.to_string())
    }
}

/// Which store backs the repositories.
pub enum Storage {
    Memory {
        loans: Arc<InMemoryLoanRepository>,
        users: Arc<InMemoryUserRepository>,
    },
    Postgres(DbPool),
}

/// Connect to PostgreSQL and apply pending migrations when a database URL is
/// configured, otherwise fall back to process-local stores.
pub async fn connect_storage(settings: &AppSettings) -> Result<Storage, StartupError> {
    let Some(url) = settings.database_url() else {
        warn!("LOANS_DATABASE_URL is unset; using in-memory stores (data is lost on restart)");
        return Ok(Storage::Memory {
            loans: Arc::new(InMemoryLoanRepository::default()),
            users: Arc::new(InMemoryUserRepository::default()),
        });
    };
    run_migrations(url).await?;
    let max_size = settings.db_max_connections()?;
    let pool = DbPool::new(PoolConfig::new(url).with_max_size(max_size)).await?;
    info!(max_size, "database pool ready");
    Ok(Storage::Postgres(pool))
}

/// Build the handler state over `storage`.
pub fn build_http_state(
    storage: &Storage,
    settings: &AppSettings,
) -> Result<HttpState, StartupError> {
    let tokens: Arc<dyn TokenCodec> = Arc::new(JwtTokenCodec::new(
        &settings.signing_secret()?,
        settings.token_ttl()?,
    )?);
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::default());
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let state = match storage {
        Storage::Memory { loans, users } => HttpState::from_stores(StateDependencies {
            loans: Arc::clone(loans),
            users: Arc::clone(users),
            hasher,
            tokens,
            clock,
        }),
        Storage::Postgres(pool) => HttpState::from_stores(StateDependencies {
            loans: Arc::new(DieselLoanRepository::new(pool.clone())),
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            hasher,
            tokens,
            clock,
        }),
    };
    Ok(state)
}
