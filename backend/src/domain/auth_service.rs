//! Authentication service: credential checks and bearer token resolution.
//!
//! Failures never reveal whether the email exists, the password was wrong or
//! the account is deactivated; every case returns the same unauthorised
//! error. The underlying cause is logged at debug level.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    IdentityResolver, LoginService, PasswordHasher, TokenCodec, TokenCodecError, UserRepository,
};
use crate::domain::user_admin_service::{map_password_hash_error, map_user_repository_error};
use crate::domain::{Error, LoginCredentials, LoginOutcome, User};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn invalid_credentials() -> Error {
    Error::unauthorized(INVALID_CREDENTIALS)
}

fn map_token_error(error: TokenCodecError) -> Error {
    match error {
        TokenCodecError::Encode { message } => {
            Error::internal(format!("token encoding failed: {message}"))
        }
        TokenCodecError::Invalid { .. } => Error::unauthorized("Invalid token"),
        TokenCodecError::Expired => Error::unauthorized("Token expired"),
    }
}

/// Login and identity resolution over a user store.
#[derive(Clone)]
pub struct AuthService<U> {
    users: Arc<U>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenCodec>,
    clock: Arc<dyn Clock>,
}

impl<U> AuthService<U> {
    /// Create the service.
    pub fn new(
        users: Arc<U>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenCodec>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            clock,
        }
    }
}

#[async_trait]
impl<U: UserRepository> LoginService for AuthService<U> {
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, Error> {
        let Some(account) = self
            .users
            .find_account_by_email(credentials.email())
            .await
            .map_err(map_user_repository_error)?
        else {
            debug!("login failed: unknown email");
            return Err(invalid_credentials());
        };

        let matches = self
            .hasher
            .verify(credentials.password(), &account.password_hash)
            .await
            .map_err(|err| {
                warn!(user_id = %account.user.id, error = %err, "stored password hash rejected");
                map_password_hash_error(err)
            })?;
        if !matches {
            debug!(user_id = %account.user.id, "login failed: password mismatch");
            return Err(invalid_credentials());
        }
        if !account.user.is_active {
            debug!(user_id = %account.user.id, "login failed: account deactivated");
            return Err(invalid_credentials());
        }

        let now = self.clock.utc();
        self.users
            .record_login(&account.user.id, now)
            .await
            .map_err(map_user_repository_error)?;
        let token = self
            .tokens
            .issue(&account.user, now)
            .map_err(map_token_error)?;

        let mut user = account.user;
        user.last_login_at = Some(now);
        info!(user_id = %user.id, role = %user.role, "user logged in");
        Ok(LoginOutcome { token, user })
    }
}

#[async_trait]
impl<U: UserRepository> IdentityResolver for AuthService<U> {
    async fn resolve(&self, token: &str) -> Result<User, Error> {
        let subject = self
            .tokens
            .verify(token, self.clock.utc())
            .map_err(map_token_error)?;
        let user = self
            .users
            .find_by_id(&subject.user_id)
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::unauthorized("User not found"))?;
        if !user.is_active {
            return Err(Error::unauthorized("Account is deactivated"));
        }
        Ok(user)
    }
}
