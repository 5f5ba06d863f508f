//! In-memory `LoanRepository`.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use pagination::PageRequest;

use crate::domain::loan::{ReviewStage, TransitionPlan};
use crate::domain::ports::{
    LoanListFilter, LoanRepository, LoanRepositoryError, LoanTotals, MonthlyActivity,
    TransitionOutcome,
};
use crate::domain::{EmailAddress, Loan, LoanId, LoanStatus, UserId};

use super::{lock, page_of};

/// Mutex-guarded loan list, kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryLoanRepository {
    loans: Mutex<Vec<Loan>>,
}

impl InMemoryLoanRepository {
    fn loans(&self) -> Result<MutexGuard<'_, Vec<Loan>>, LoanRepositoryError> {
        lock(&self.loans, LoanRepositoryError::query)
    }
}

fn newest_first(loans: &[Loan], keep: impl Fn(&Loan) -> bool) -> Vec<Loan> {
    let mut matching: Vec<Loan> = loans.iter().rev().filter(|loan| keep(loan)).cloned().collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    matching
}

fn decision_of(loan: &Loan, stage: ReviewStage) -> (Option<UserId>, Option<DateTime<Utc>>) {
    match stage {
        ReviewStage::Verification => (loan.verified_by, loan.verified_at),
        ReviewStage::Approval => (loan.approved_by, loan.approved_at),
    }
}

#[async_trait]
impl LoanRepository for InMemoryLoanRepository {
    async fn insert(&self, loan: &Loan) -> Result<(), LoanRepositoryError> {
        let mut loans = self.loans()?;
        if loan.status.is_open()
            && loans
                .iter()
                .any(|existing| existing.status.is_open() && existing.email == loan.email)
        {
            return Err(LoanRepositoryError::duplicate_open_application(
                loan.email.as_ref(),
            ));
        }
        loans.push(loan.clone());
        Ok(())
    }

    async fn find_open_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Loan>, LoanRepositoryError> {
        Ok(self
            .loans()?
            .iter()
            .find(|loan| loan.status.is_open() && loan.email == *email)
            .cloned())
    }

    async fn find_by_id(&self, id: &LoanId) -> Result<Option<Loan>, LoanRepositoryError> {
        Ok(self.loans()?.iter().find(|loan| loan.id == *id).cloned())
    }

    async fn list(
        &self,
        filter: &LoanListFilter,
        page: PageRequest,
    ) -> Result<(Vec<Loan>, u64), LoanRepositoryError> {
        let matching = newest_first(&self.loans()?, |loan| filter.matches(loan));
        let total = matching.len() as u64;
        Ok((page_of(&matching, page), total))
    }

    async fn transition(
        &self,
        id: &LoanId,
        plan: &TransitionPlan,
    ) -> Result<TransitionOutcome, LoanRepositoryError> {
        let mut loans = self.loans()?;
        let Some(loan) = loans.iter_mut().find(|loan| loan.id == *id) else {
            return Ok(TransitionOutcome::Missing);
        };
        if loan.status != plan.expected {
            return Ok(TransitionOutcome::StatusMismatch {
                actual: loan.status,
            });
        }
        plan.apply(loan);
        Ok(TransitionOutcome::Applied(loan.clone()))
    }

    async fn totals(&self) -> Result<LoanTotals, LoanRepositoryError> {
        let loans = self.loans()?;
        Ok(loans.iter().fold(LoanTotals::default(), |mut totals, loan| {
            totals.counts.add(loan.status, 1);
            totals.total_amount += loan.amount;
            if loan.status == LoanStatus::Approved {
                totals.approved_amount += loan.amount;
            }
            totals
        }))
    }

    async fn count_created_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<u64, LoanRepositoryError> {
        Ok(self
            .loans()?
            .iter()
            .filter(|loan| loan.created_at >= since)
            .count() as u64)
    }

    async fn monthly_activity(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MonthlyActivity>, LoanRepositoryError> {
        let loans = self.loans()?;
        let mut activity: Vec<MonthlyActivity> = Vec::new();
        for loan in loans.iter().filter(|loan| loan.created_at >= since) {
            let (year, month) = (loan.created_at.year(), loan.created_at.month());
            let index = match activity
                .iter()
                .position(|row| row.year == year && row.month == month)
            {
                Some(index) => index,
                None => {
                    activity.push(MonthlyActivity {
                        year,
                        month,
                        applications: 0,
                        total_amount: 0.0,
                        approved: 0,
                    });
                    activity.len() - 1
                }
            };
            let row = &mut activity[index];
            row.applications += 1;
            row.total_amount += loan.amount;
            if loan.status == LoanStatus::Approved {
                row.approved += 1;
            }
        }
        activity.sort_by_key(|row| (row.year, row.month));
        Ok(activity)
    }

    async fn count_decisions(
        &self,
        actor: &UserId,
        stage: ReviewStage,
        since: Option<DateTime<Utc>>,
    ) -> Result<u64, LoanRepositoryError> {
        Ok(self
            .loans()?
            .iter()
            .filter(|loan| {
                let (by, at) = decision_of(loan, stage);
                by == Some(*actor) && since.is_none_or(|since| at.is_some_and(|at| at >= since))
            })
            .count() as u64)
    }

    async fn recent(
        &self,
        status: Option<LoanStatus>,
        limit: u32,
    ) -> Result<Vec<Loan>, LoanRepositoryError> {
        let mut matching =
            newest_first(&self.loans()?, |loan| status.is_none_or(|s| loan.status == s));
        matching.truncate(limit as usize);
        Ok(matching)
    }
}
