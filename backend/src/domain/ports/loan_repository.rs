//! Port for the loan record store.
//!
//! Status changes go through [`LoanRepository::transition`], which must apply
//! the plan only while the stored status still equals
//! [`TransitionPlan::expected`]. Adapters implement this as a single
//! conditional update so concurrent reviewers cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageRequest;

use crate::domain::loan::{ReviewStage, TransitionPlan};
use crate::domain::{EmailAddress, Loan, LoanId, LoanStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by loan repository adapters.
    pub enum LoanRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "loan repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "loan repository query failed: {message}",
        /// An open application already exists for the email.
        DuplicateOpenApplication { email: String } =>
            "an open application already exists for {email}",
    }
}

/// Filters for listing loans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanListFilter {
    /// Restrict to one status.
    pub status: Option<LoanStatus>,
    /// Case-insensitive substring matched against applicant name, email and
    /// purpose.
    pub search: Option<String>,
}

impl LoanListFilter {
    /// Whether `loan` satisfies the filter.
    pub fn matches(&self, loan: &Loan) -> bool {
        if self.status.is_some_and(|status| status != loan.status) {
            return false;
        }
        match &self.search {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                [
                    loan.applicant_name.as_ref(),
                    loan.email.as_ref(),
                    loan.purpose.as_str(),
                ]
                .iter()
                .any(|haystack| haystack.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Outcome of a conditional status update.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// The plan was applied; carries the updated loan.
    Applied(Loan),
    /// The loan exists but no longer holds the expected status.
    StatusMismatch {
        /// Status found at update time.
        actual: LoanStatus,
    },
    /// The loan does not exist.
    Missing,
}

/// Number of loans in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Pending loans.
    pub pending: u64,
    /// Verified loans.
    pub verified: u64,
    /// Approved loans.
    pub approved: u64,
    /// Rejected loans.
    pub rejected: u64,
}

impl StatusCounts {
    /// Count for `status`.
    pub fn get(&self, status: LoanStatus) -> u64 {
        match status {
            LoanStatus::Pending => self.pending,
            LoanStatus::Verified => self.verified,
            LoanStatus::Approved => self.approved,
            LoanStatus::Rejected => self.rejected,
        }
    }

    /// Increment the count for `status`.
    pub fn add(&mut self, status: LoanStatus, count: u64) {
        let slot = match status {
            LoanStatus::Pending => &mut self.pending,
            LoanStatus::Verified => &mut self.verified,
            LoanStatus::Approved => &mut self.approved,
            LoanStatus::Rejected => &mut self.rejected,
        };
        *slot += count;
    }

    /// Sum over every status.
    pub fn total(&self) -> u64 {
        self.pending + self.verified + self.approved + self.rejected
    }
}

/// Store-wide loan aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoanTotals {
    /// Per-status counts.
    pub counts: StatusCounts,
    /// Sum of requested amounts across all loans.
    pub total_amount: f64,
    /// Sum of requested amounts across approved loans.
    pub approved_amount: f64,
}

/// Loans created in one calendar month (UTC).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyActivity {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1 to 12.
    pub month: u32,
    /// Applications created in the month.
    pub applications: u64,
    /// Sum of their requested amounts.
    pub total_amount: f64,
    /// How many of them are approved now.
    pub approved: u64,
}

/// Read and write access to loan applications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// Store a new loan.
    ///
    /// Fails with [`LoanRepositoryError::DuplicateOpenApplication`] when an
    /// open application already exists for the same email.
    async fn insert(&self, loan: &Loan) -> Result<(), LoanRepositoryError>;

    /// Any pending or verified loan for `email`.
    async fn find_open_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Loan>, LoanRepositoryError>;

    /// Fetch a loan by identifier.
    async fn find_by_id(&self, id: &LoanId) -> Result<Option<Loan>, LoanRepositoryError>;

    /// Newest-first page of loans plus the total number of matches.
    async fn list(
        &self,
        filter: &LoanListFilter,
        page: PageRequest,
    ) -> Result<(Vec<Loan>, u64), LoanRepositoryError>;

    /// Apply `plan` if the loan still holds `plan.expected`.
    async fn transition(
        &self,
        id: &LoanId,
        plan: &TransitionPlan,
    ) -> Result<TransitionOutcome, LoanRepositoryError>;

    /// Store-wide counts and sums.
    async fn totals(&self) -> Result<LoanTotals, LoanRepositoryError>;

    /// Number of loans created at or after `since`.
    async fn count_created_since(&self, since: DateTime<Utc>)
    -> Result<u64, LoanRepositoryError>;

    /// Per-month activity for loans created at or after `since`. Months
    /// without loans may be omitted.
    async fn monthly_activity(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MonthlyActivity>, LoanRepositoryError>;

    /// Decisions recorded by `actor` at `stage`, optionally only those taken
    /// at or after `since`.
    async fn count_decisions(
        &self,
        actor: &UserId,
        stage: ReviewStage,
        since: Option<DateTime<Utc>>,
    ) -> Result<u64, LoanRepositoryError>;

    /// Newest loans, optionally restricted to one status.
    async fn recent(
        &self,
        status: Option<LoanStatus>,
        limit: u32,
    ) -> Result<Vec<Loan>, LoanRepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_loan;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, true)]
    #[case(Some(LoanStatus::Pending), None, true)]
    #[case(Some(LoanStatus::Approved), None, false)]
    #[case(None, Some("JANE"), true)]
    #[case(None, Some("x.com"), true)]
    #[case(None, Some("improvement"), true)]
    #[case(None, Some("mortgage"), false)]
    fn filter_matches(
        #[case] status: Option<LoanStatus>,
        #[case] search: Option<&str>,
        #[case] expected: bool,
    ) {
        let filter = LoanListFilter {
            status,
            search: search.map(str::to_owned),
        };
        assert_eq!(filter.matches(&sample_loan(LoanStatus::Pending)), expected);
    }

    #[rstest]
    fn status_counts_total() {
        let mut counts = StatusCounts::default();
        counts.add(LoanStatus::Pending, 2);
        counts.add(LoanStatus::Rejected, 3);
        assert_eq!(counts.get(LoanStatus::Rejected), 3);
        assert_eq!(counts.total(), 5);
    }
}
