//! Driving port for dashboard statistics.

use async_trait::async_trait;

use crate::domain::dashboard::{DashboardStats, MyActivity};
use crate::domain::{Error, LoanView, User};

/// Read-only, role-scoped dashboard views.
#[async_trait]
pub trait DashboardQuery: Send + Sync {
    /// Store-wide statistics. User head counts are included for admins only.
    async fn stats(&self, viewer: &User) -> Result<DashboardStats, Error>;

    /// Newest loans visible to `viewer`.
    async fn recent_loans(&self, viewer: &User, limit: Option<u32>)
    -> Result<Vec<LoanView>, Error>;

    /// Decision counts for `viewer` plus the size of their work queue.
    async fn my_activity(&self, viewer: &User) -> Result<MyActivity, Error>;
}
