//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::PageRequest;

use crate::domain::ports::{UserCounts, UserRepository, UserRepositoryError};
use crate::domain::{
    EmailAddress, PersonName, Role, User, UserAccount, UserId, UserSummary,
};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, unique_violation_constraint,
};
use super::models::{NewUserRow, UserRow, UserSummaryRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    map_basic_pool_error(error, UserRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    map_basic_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

fn corrupt(field: &str, err: impl std::fmt::Display) -> UserRepositoryError {
    UserRepositoryError::query(format!("invalid {field} in users table: {err}"))
}

fn row_to_account(row: UserRow) -> Result<UserAccount, UserRepositoryError> {
    let UserRow {
        id,
        email,
        password_hash,
        name,
        role,
        is_active,
        last_login_at,
        created_at,
        updated_at,
    } = row;
    let user = User {
        id: UserId::from_uuid(id),
        name: PersonName::new(&name).map_err(|err| corrupt("name", err))?,
        email: EmailAddress::new(&email).map_err(|err| corrupt("email", err))?,
        role: Role::from_str(&role).map_err(|err| corrupt("role", err))?,
        is_active,
        last_login_at,
        created_at,
        updated_at,
    };
    Ok(UserAccount {
        user,
        password_hash,
    })
}

fn row_to_user(row: UserRow) -> Result<User, UserRepositoryError> {
    row_to_account(row).map(|account| account.user)
}

fn row_to_summary(row: UserSummaryRow) -> Result<UserSummary, UserRepositoryError> {
    Ok(UserSummary {
        id: UserId::from_uuid(row.id),
        name: PersonName::new(&row.name).map_err(|err| corrupt("name", err))?,
        email: EmailAddress::new(&row.email).map_err(|err| corrupt("email", err))?,
    })
}

fn filtered(role: Option<Role>) -> users::BoxedQuery<'static, Pg> {
    let query = users::table.into_boxed();
    match role {
        Some(role) => query.filter(users::role.eq(role.as_str())),
        None => query,
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, account: &UserAccount) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user = &account.user;
        let row = NewUserRow {
            id: *user.id.as_uuid(),
            email: user.email.as_ref(),
            password_hash: &account.password_hash,
            name: user.name.as_ref(),
            role: user.role.as_str(),
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if unique_violation_constraint(&err).is_some() {
                    UserRepositoryError::duplicate_email(user.email.as_ref())
                } else {
                    map_diesel_error(err)
                }
            })
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_user)
            .transpose()
    }

    async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserAccount>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_account)
            .transpose()
    }

    async fn find_summaries(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<UserSummary>, UserRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<UserSummaryRow> = users::table
            .filter(users::id.eq_any(uuids))
            .select(UserSummaryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_summary).collect()
    }

    async fn list(
        &self,
        role: Option<Role>,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(role)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<UserRow> = filtered(role)
            .order((users::created_at.desc(), users::id.desc()))
            .limit(i64::from(page.limit()))
            .offset(to_i64(page.offset()))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let users = rows
            .into_iter()
            .map(row_to_user)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((users, to_u64(total)))
    }

    async fn set_active(
        &self,
        id: &UserId,
        active: bool,
        at: DateTime<Utc>,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(users::table.find(*id.as_uuid()))
            .set((users::is_active.eq(active), users::updated_at.eq(at)))
            .returning(UserRow::as_returning())
            .get_result::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_user)
            .transpose()
    }

    async fn record_login(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(users::table.find(*id.as_uuid()))
            .set(users::last_login_at.eq(Some(at)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn counts(&self) -> Result<UserCounts, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let groups: Vec<(String, bool, i64)> = users::table
            .group_by((users::role, users::is_active))
            .select((users::role, users::is_active, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        groups
            .into_iter()
            .try_fold(UserCounts::default(), |mut counts, (role, active, count)| {
                let count = to_u64(count);
                counts.total += count;
                if active {
                    counts.active += count;
                } else {
                    counts.inactive += count;
                }
                match Role::from_str(&role).map_err(|err| corrupt("role", err))? {
                    Role::Admin => counts.admins += count,
                    Role::Verifier => counts.verifiers += count,
                }
                Ok(counts)
            })
    }
}
