//! Loan lifecycle service implementing the loan command and query ports.
//!
//! Submissions are validated in full and checked for an open application
//! with the same email. Review decisions are authorised against the policy
//! table, planned by [`plan_transition`] and applied with the repository's
//! conditional update.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::Paginated;
use tracing::{debug, info};

use crate::domain::loan::{ApplicationForm, LoanApplication, ReviewDecision, plan_transition};
use crate::domain::ports::{
    ListLoansRequest, LoanCommand, LoanListFilter, LoanQuery, LoanRepository,
    LoanRepositoryError, ReviewRequest, TransitionOutcome, UserRepository,
};
use crate::domain::user_admin_service::map_user_repository_error;
use crate::domain::{
    Error, Loan, LoanId, LoanStatus, LoanView, Operation, Role, SubmittedLoan, User, UserId,
    authorize,
};

pub(crate) fn map_loan_repository_error(error: LoanRepositoryError) -> Error {
    match error {
        LoanRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("loan repository unavailable: {message}"))
        }
        LoanRepositoryError::Query { message } => {
            Error::internal(format!("loan repository error: {message}"))
        }
        LoanRepositoryError::DuplicateOpenApplication { .. } => duplicate_application_error(),
    }
}

fn duplicate_application_error() -> Error {
    Error::duplicate_application(
        "An application with this email is already pending or verified",
    )
}

/// Loan lifecycle service.
#[derive(Clone)]
pub struct LoanService<L, U> {
    loans: Arc<L>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<L, U> LoanService<L, U> {
    /// Create a service over the given stores.
    ///
    /// ```rust
    /// # use std::sync::Arc;
    /// # use loan_backend::domain::LoanService;
    /// # use loan_backend::outbound::memory::{InMemoryLoanRepository, InMemoryUserRepository};
    /// # use mockable::DefaultClock;
    /// let service = LoanService::new(
    ///     Arc::new(InMemoryLoanRepository::default()),
    ///     Arc::new(InMemoryUserRepository::default()),
    ///     Arc::new(DefaultClock),
    /// );
    /// # let _ = service;
    /// ```
    pub fn new(loans: Arc<L>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            loans,
            users,
            clock,
        }
    }
}

impl<L, U> LoanService<L, U>
where
    L: LoanRepository,
    U: UserRepository,
{
    pub(crate) async fn expand(&self, loans: Vec<Loan>) -> Result<Vec<LoanView>, Error> {
        let ids: Vec<UserId> = loans
            .iter()
            .flat_map(Loan::actor_ids)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let summaries = if ids.is_empty() {
            Vec::new()
        } else {
            self.users
                .find_summaries(&ids)
                .await
                .map_err(map_user_repository_error)?
        };
        Ok(loans
            .into_iter()
            .map(|loan| LoanView::expand(loan, &summaries))
            .collect())
    }

    async fn expand_one(&self, loan: Loan) -> Result<LoanView, Error> {
        self.expand(vec![loan])
            .await?
            .pop()
            .ok_or_else(|| Error::internal("loan expansion lost its input"))
    }

    async fn load(&self, id: &LoanId) -> Result<Loan, Error> {
        self.loans
            .find_by_id(id)
            .await
            .map_err(map_loan_repository_error)?
            .ok_or_else(|| Error::not_found("Loan not found"))
    }
}

/// Verifiers only ever see the pending queue.
pub(crate) fn visible_status(viewer: &User, requested: Option<LoanStatus>) -> Option<LoanStatus> {
    match viewer.role {
        Role::Verifier => Some(LoanStatus::Pending),
        Role::Admin => requested,
    }
}

#[async_trait]
impl<L, U> LoanCommand for LoanService<L, U>
where
    L: LoanRepository,
    U: UserRepository,
{
    async fn submit(&self, form: ApplicationForm) -> Result<SubmittedLoan, Error> {
        let application = LoanApplication::validate(form).map_err(Error::validation)?;

        let existing = self
            .loans
            .find_open_by_email(&application.email)
            .await
            .map_err(map_loan_repository_error)?;
        if existing.is_some() {
            debug!(email = %application.email, "rejecting duplicate open application");
            return Err(duplicate_application_error());
        }

        let loan = Loan::submit(application, self.clock.utc());
        self.loans
            .insert(&loan)
            .await
            .map_err(map_loan_repository_error)?;

        info!(loan_id = %loan.id, amount = loan.amount, "loan application submitted");
        Ok(SubmittedLoan {
            loan_id: loan.id,
            status: loan.status,
        })
    }

    async fn review(&self, actor: &User, request: ReviewRequest) -> Result<LoanView, Error> {
        let ReviewRequest {
            loan_id,
            stage,
            action,
            rejection_reason,
        } = request;
        let actor = authorize(Some(actor), stage.operation())?;
        let decision = ReviewDecision::parse(stage, &action, rejection_reason.as_deref())?;

        let loan = self.load(&loan_id).await?;
        let plan = plan_transition(loan.status, &decision, actor.id, self.clock.utc())?;

        let outcome = self
            .loans
            .transition(&loan_id, &plan)
            .await
            .map_err(map_loan_repository_error)?;

        match outcome {
            TransitionOutcome::Applied(updated) => {
                info!(
                    loan_id = %loan_id,
                    actor = %actor.id,
                    stage = %stage,
                    from = %plan.expected,
                    to = %plan.next,
                    "loan status changed"
                );
                self.expand_one(updated).await
            }
            TransitionOutcome::StatusMismatch { actual } => {
                debug!(loan_id = %loan_id, %actual, "concurrent review detected");
                Err(Error::conflict(format!(
                    "Loan status changed to '{actual}' while the request was processed"
                )))
            }
            TransitionOutcome::Missing => Err(Error::not_found("Loan not found")),
        }
    }
}

#[async_trait]
impl<L, U> LoanQuery for LoanService<L, U>
where
    L: LoanRepository,
    U: UserRepository,
{
    async fn list(
        &self,
        viewer: &User,
        request: ListLoansRequest,
    ) -> Result<Paginated<LoanView>, Error> {
        let viewer = authorize(Some(viewer), Operation::ListLoans)?;
        let filter = LoanListFilter {
            status: visible_status(viewer, request.status),
            search: request
                .search
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty()),
        };
        let (loans, total) = self
            .loans
            .list(&filter, request.page)
            .await
            .map_err(map_loan_repository_error)?;
        let views = self.expand(loans).await?;
        Ok(Paginated::new(views, request.page, total))
    }

    async fn get(&self, viewer: &User, id: &LoanId) -> Result<LoanView, Error> {
        let viewer = authorize(Some(viewer), Operation::ViewLoan)?;
        let loan = self.load(id).await?;
        if viewer.role == Role::Verifier && loan.status != LoanStatus::Pending {
            return Err(Error::forbidden("Verifiers can only view pending loans"));
        }
        self.expand_one(loan).await
    }
}
