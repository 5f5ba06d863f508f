//! Driving port for the login use-case.
//!
//! Inbound adapters call it to exchange credentials for a bearer token
//! without knowing how accounts are stored or tokens are signed.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, LoginOutcome};

/// Domain use-case port for authentication.
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and issue a token.
    ///
    /// Unknown emails, wrong passwords and deactivated accounts all fail
    /// with the same unauthorised error.
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, Error>;
}
