//! Driving port behind the bearer authentication extractor.

use async_trait::async_trait;

use crate::domain::{Error, User};

/// Resolve a presented bearer token to an active user.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Fails with an unauthorised error when the token is malformed,
    /// expired, or names a user that is missing or inactive.
    async fn resolve(&self, token: &str) -> Result<User, Error>;
}
