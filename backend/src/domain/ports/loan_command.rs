//! Driving port for loan mutations: submission and review decisions.

use async_trait::async_trait;

use crate::domain::loan::{ApplicationForm, ReviewStage};
use crate::domain::{Error, LoanId, LoanView, SubmittedLoan, User};

/// A review decision as received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    /// Loan under review.
    pub loan_id: LoanId,
    /// Stage the endpoint acts on.
    pub stage: ReviewStage,
    /// Raw action keyword.
    pub action: String,
    /// Reason, required for rejections.
    pub rejection_reason: Option<String>,
}

/// Loan mutations.
#[async_trait]
pub trait LoanCommand: Send + Sync {
    /// Validate and store a new application. Public; no identity required.
    async fn submit(&self, form: ApplicationForm) -> Result<SubmittedLoan, Error>;

    /// Apply a verification or approval decision on behalf of `actor`.
    async fn review(&self, actor: &User, request: ReviewRequest) -> Result<LoanView, Error>;
}
