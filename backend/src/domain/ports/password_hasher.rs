//! Port for one-way password hashing.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Failures raised by password hashing adapters.
    pub enum PasswordHashError {
        /// Hashing the password failed.
        Hash { message: String } => "password hashing failed: {message}",
        /// The stored hash could not be parsed.
        MalformedHash { message: String } => "stored password hash is malformed: {message}",
    }
}

/// Hash new passwords and check candidates against stored hashes.
///
/// Adapters doing CPU-heavy work must keep it off the async workers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Produce a self-describing hash string for `password`.
    async fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Whether `password` matches `stored_hash`.
    async fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordHashError>;
}

/// Reversible stand-in for tests that do not exercise hashing strength.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePasswordHasher;

const FIXTURE_PREFIX: &str = "fixture$";

impl FixturePasswordHasher {
    /// The stored form of `password`, for seeding accounts directly.
    pub fn encode(password: &str) -> String {
        format!("{FIXTURE_PREFIX}{password}")
    }
}

#[async_trait]
impl PasswordHasher for FixturePasswordHasher {
    async fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        Ok(Self::encode(password))
    }

    async fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordHashError> {
        stored_hash
            .strip_prefix(FIXTURE_PREFIX)
            .map(|expected| expected == password)
            .ok_or_else(|| PasswordHashError::malformed_hash("missing fixture prefix"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_round_trips() {
        let hasher = FixturePasswordHasher;
        let hash = hasher.hash("correct horse").await.expect("hash");
        assert_eq!(hash, FixturePasswordHasher::encode("correct horse"));
        assert_eq!(hasher.verify("correct horse", &hash).await, Ok(true));
        assert_eq!(hasher.verify("wrong", &hash).await, Ok(false));
    }

    #[tokio::test]
    async fn fixture_rejects_foreign_hashes() {
        let result = FixturePasswordHasher.verify("pw", "$argon2id$v=19$...").await;
        assert!(matches!(result, Err(PasswordHashError::MalformedHash { .. })));
    }
}
