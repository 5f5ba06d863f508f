//! Staff account administration service.
//!
//! Every operation is admin-only. Creation validates all fields up front and
//! reports each violation; deactivation is soft and never removes the row.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::{PageRequest, Paginated};
use tracing::info;

use crate::domain::ports::{
    CreateUserRequest, PasswordHashError, PasswordHasher, UserAdministration, UserRepository,
    UserRepositoryError,
};
use crate::domain::{
    EmailAddress, Error, FieldViolation, NewPassword, Operation, PersonName, Role, User,
    UserAccount, UserId, authorize,
};

pub(crate) fn map_user_repository_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateEmail { .. } => email_taken(),
    }
}

pub(crate) fn map_password_hash_error(error: PasswordHashError) -> Error {
    Error::internal(error.to_string())
}

fn email_taken() -> Error {
    Error::validation(vec![FieldViolation::new(
        "email",
        "email_taken",
        "A user with this email already exists",
    )])
}

fn required(field: &str) -> FieldViolation {
    FieldViolation::new(field, "required", format!("{field} is required"))
}

struct ValidatedUser {
    name: PersonName,
    email: EmailAddress,
    password: NewPassword,
    role: Role,
}

fn validate(request: CreateUserRequest) -> Result<ValidatedUser, Error> {
    let mut violations = Vec::new();

    let name = match request.name.as_deref().map(PersonName::new) {
        Some(Ok(name)) => Some(name),
        Some(Err(err)) => {
            violations.push(FieldViolation::new("name", err.code(), err.to_string()));
            None
        }
        None => {
            violations.push(required("name"));
            None
        }
    };
    let email = match request.email.as_deref().map(EmailAddress::new) {
        Some(Ok(email)) => Some(email),
        Some(Err(err)) => {
            violations.push(FieldViolation::new("email", err.code(), err.to_string()));
            None
        }
        None => {
            violations.push(required("email"));
            None
        }
    };
    let password = match request.password.as_deref().map(NewPassword::new) {
        Some(Ok(password)) => Some(password),
        Some(Err(err)) => {
            violations.push(FieldViolation::new("password", "too_short", err.to_string()));
            None
        }
        None => {
            violations.push(required("password"));
            None
        }
    };
    let role = match request.role.as_deref().map(str::parse::<Role>) {
        Some(Ok(role)) => Some(role),
        Some(Err(err)) => {
            violations.push(FieldViolation::new("role", err.code(), err.to_string()));
            None
        }
        None => {
            violations.push(required("role"));
            None
        }
    };

    match (name, email, password, role) {
        (Some(name), Some(email), Some(password), Some(role)) if violations.is_empty() => {
            Ok(ValidatedUser {
                name,
                email,
                password,
                role,
            })
        }
        _ => Err(Error::validation(violations)),
    }
}

/// Admin-only account management over a [`UserRepository`].
#[derive(Clone)]
pub struct UserAdminService<U> {
    users: Arc<U>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
}

impl<U> UserAdminService<U> {
    /// Create a service over the given store and hasher.
    pub fn new(users: Arc<U>, hasher: Arc<dyn PasswordHasher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            hasher,
            clock,
        }
    }
}

impl<U: UserRepository> UserAdminService<U> {
    /// Create the first administrator without an acting user.
    ///
    /// Refuses once any admin account exists, active or not.
    pub async fn bootstrap_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, Error> {
        let validated = validate(CreateUserRequest {
            name: Some(name.to_owned()),
            email: Some(email.to_owned()),
            password: Some(password.to_owned()),
            role: Some(Role::Admin.as_str().to_owned()),
        })?;
        let counts = self
            .users
            .counts()
            .await
            .map_err(map_user_repository_error)?;
        if counts.admins > 0 {
            return Err(Error::conflict("An administrator already exists"));
        }
        let user = self.insert(validated).await?;
        info!(user_id = %user.id, "bootstrap administrator created");
        Ok(user)
    }

    async fn insert(&self, validated: ValidatedUser) -> Result<User, Error> {
        let ValidatedUser {
            name,
            email,
            password,
            role,
        } = validated;
        let password_hash = self
            .hasher
            .hash(password.expose())
            .await
            .map_err(map_password_hash_error)?;
        let now = self.clock.utc();
        let account = UserAccount {
            user: User {
                id: UserId::random(),
                name,
                email,
                role,
                is_active: true,
                last_login_at: None,
                created_at: now,
                updated_at: now,
            },
            password_hash,
        };
        self.users
            .create(&account)
            .await
            .map_err(map_user_repository_error)?;
        Ok(account.user)
    }

    async fn set_active(&self, actor: &User, id: &UserId, active: bool) -> Result<User, Error> {
        let actor = authorize(Some(actor), Operation::ManageUsers)?;
        if actor.id == *id {
            let verb = if active { "activate" } else { "deactivate" };
            return Err(Error::invalid_request(format!(
                "You cannot {verb} your own account"
            )));
        }
        let user = self
            .users
            .set_active(id, active, self.clock.utc())
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::not_found("User not found"))?;
        info!(user_id = %user.id, actor = %actor.id, active, "user activation changed");
        Ok(user)
    }
}

#[async_trait]
impl<U: UserRepository> UserAdministration for UserAdminService<U> {
    async fn list(
        &self,
        actor: &User,
        role: Option<Role>,
        page: PageRequest,
    ) -> Result<Paginated<User>, Error> {
        authorize(Some(actor), Operation::ManageUsers)?;
        let (users, total) = self
            .users
            .list(role, page)
            .await
            .map_err(map_user_repository_error)?;
        Ok(Paginated::new(users, page, total))
    }

    async fn create(&self, actor: &User, request: CreateUserRequest) -> Result<User, Error> {
        let actor = authorize(Some(actor), Operation::ManageUsers)?;
        let user = self.insert(validate(request)?).await?;
        info!(user_id = %user.id, role = %user.role, actor = %actor.id, "user created");
        Ok(user)
    }

    async fn deactivate(&self, actor: &User, id: &UserId) -> Result<User, Error> {
        self.set_active(actor, id, false).await
    }

    async fn activate(&self, actor: &User, id: &UserId) -> Result<User, Error> {
        self.set_active(actor, id, true).await
    }
}

#[cfg(test)]
#[path = "user_admin_service_tests.rs"]
mod tests;
