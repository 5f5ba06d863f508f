//! Driving port for staff account administration.

use async_trait::async_trait;
use pagination::{PageRequest, Paginated};

use crate::domain::{Error, Role, User, UserId};

/// Raw account creation input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateUserRequest {
    /// Display name.
    pub name: Option<String>,
    /// Login email.
    pub email: Option<String>,
    /// Initial password.
    pub password: Option<String>,
    /// Role keyword.
    pub role: Option<String>,
}

/// Admin-only account management.
#[async_trait]
pub trait UserAdministration: Send + Sync {
    /// Page through accounts, newest first.
    async fn list(
        &self,
        actor: &User,
        role: Option<Role>,
        page: PageRequest,
    ) -> Result<Paginated<User>, Error>;

    /// Create an account.
    async fn create(&self, actor: &User, request: CreateUserRequest) -> Result<User, Error>;

    /// Soft-deactivate an account. Admins cannot deactivate themselves.
    async fn deactivate(&self, actor: &User, id: &UserId) -> Result<User, Error>;

    /// Reactivate an account.
    async fn activate(&self, actor: &User, id: &UserId) -> Result<User, Error>;
}
