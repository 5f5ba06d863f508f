//! In-memory `UserRepository`.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageRequest;

use crate::domain::ports::{UserCounts, UserRepository, UserRepositoryError};
use crate::domain::{Role, User, UserAccount, UserId, UserSummary};

use super::{lock, page_of};

/// Mutex-guarded account list, kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    accounts: Mutex<Vec<UserAccount>>,
}

impl InMemoryUserRepository {
    fn accounts(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Vec<UserAccount>>, UserRepositoryError> {
        lock(&self.accounts, UserRepositoryError::query)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, account: &UserAccount) -> Result<(), UserRepositoryError> {
        let mut accounts = self.accounts()?;
        if accounts
            .iter()
            .any(|existing| existing.user.email == account.user.email)
        {
            return Err(UserRepositoryError::duplicate_email(
                account.user.email.as_ref(),
            ));
        }
        accounts.push(account.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self
            .accounts()?
            .iter()
            .find(|account| account.user.id == *id)
            .map(|account| account.user.clone()))
    }

    async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserAccount>, UserRepositoryError> {
        Ok(self
            .accounts()?
            .iter()
            .find(|account| account.user.email.as_ref() == email)
            .cloned())
    }

    async fn find_summaries(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<UserSummary>, UserRepositoryError> {
        Ok(self
            .accounts()?
            .iter()
            .filter(|account| ids.contains(&account.user.id))
            .map(|account| account.user.summary())
            .collect())
    }

    async fn list(
        &self,
        role: Option<Role>,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), UserRepositoryError> {
        let accounts = self.accounts()?;
        let mut matching: Vec<User> = accounts
            .iter()
            .rev()
            .filter(|account| role.is_none_or(|role| account.user.role == role))
            .map(|account| account.user.clone())
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as u64;
        Ok((page_of(&matching, page), total))
    }

    async fn set_active(
        &self,
        id: &UserId,
        active: bool,
        at: DateTime<Utc>,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut accounts = self.accounts()?;
        Ok(accounts
            .iter_mut()
            .find(|account| account.user.id == *id)
            .map(|account| {
                account.user.is_active = active;
                account.user.updated_at = at;
                account.user.clone()
            }))
    }

    async fn record_login(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError> {
        let mut accounts = self.accounts()?;
        if let Some(account) = accounts.iter_mut().find(|account| account.user.id == *id) {
            account.user.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn counts(&self) -> Result<UserCounts, UserRepositoryError> {
        let accounts = self.accounts()?;
        Ok(accounts
            .iter()
            .fold(UserCounts::default(), |mut counts, account| {
                counts.total += 1;
                if account.user.is_active {
                    counts.active += 1;
                } else {
                    counts.inactive += 1;
                }
                match account.user.role {
                    Role::Admin => counts.admins += 1,
                    Role::Verifier => counts.verifiers += 1,
                }
                counts
            }))
    }
}
