//! Driving port for role-scoped loan reads.

use async_trait::async_trait;
use pagination::{PageRequest, Paginated};

use crate::domain::{Error, LoanId, LoanStatus, LoanView, User};

/// Listing parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListLoansRequest {
    /// Requested status filter. Ignored for verifiers.
    pub status: Option<LoanStatus>,
    /// Free-text search.
    pub search: Option<String>,
    /// Page window.
    pub page: PageRequest,
}

/// Loan reads scoped by the viewer's role.
#[async_trait]
pub trait LoanQuery: Send + Sync {
    /// Page through loans visible to `viewer`.
    async fn list(
        &self,
        viewer: &User,
        request: ListLoansRequest,
    ) -> Result<Paginated<LoanView>, Error>;

    /// Read one loan. Verifiers may only read pending loans.
    async fn get(&self, viewer: &User, id: &LoanId) -> Result<LoanView, Error>;
}
