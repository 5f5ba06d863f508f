//! Port for the credential and identity store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageRequest;
use serde::Serialize;

use crate::domain::{Role, User, UserAccount, UserId, UserSummary};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the email address.
        DuplicateEmail { email: String } => "email already registered: {email}",
    }
}

/// Head counts over the user table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCounts {
    /// All accounts.
    pub total: u64,
    /// Accounts that may log in.
    pub active: u64,
    /// Soft-deactivated accounts.
    pub inactive: u64,
    /// Accounts with the admin role.
    pub admins: u64,
    /// Accounts with the verifier role.
    pub verifiers: u64,
}

/// Read and write access to staff accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new account.
    ///
    /// Fails with [`UserRepositoryError::DuplicateEmail`] when the email is
    /// already registered.
    async fn create(&self, account: &UserAccount) -> Result<(), UserRepositoryError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch an account, including its password hash, by normalised email.
    async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserAccount>, UserRepositoryError>;

    /// Summaries for the given identifiers. Unknown ids are skipped.
    async fn find_summaries(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<UserSummary>, UserRepositoryError>;

    /// Newest-first page of users, optionally filtered by role, plus the
    /// total number of matches.
    async fn list(
        &self,
        role: Option<Role>,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), UserRepositoryError>;

    /// Flip the active flag. Returns `None` when the user does not exist.
    async fn set_active(
        &self,
        id: &UserId,
        active: bool,
        at: DateTime<Utc>,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Stamp a successful login.
    async fn record_login(&self, id: &UserId, at: DateTime<Utc>)
    -> Result<(), UserRepositoryError>;

    /// Head counts by role and active flag.
    async fn counts(&self) -> Result<UserCounts, UserRepositoryError>;
}
