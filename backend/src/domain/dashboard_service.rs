//! Dashboard service assembling role-scoped statistics.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::dashboard::{
    DashboardStats, MyActivity, monthly_trends, recent_window_start, start_of_day,
    trend_window_start,
};
use crate::domain::loan::ReviewStage;
use crate::domain::loan_service::{LoanService, map_loan_repository_error, visible_status};
use crate::domain::ports::{DashboardQuery, LoanRepository, UserRepository};
use crate::domain::user_admin_service::map_user_repository_error;
use crate::domain::{Error, LoanView, Operation, Role, User, authorize};

/// Default number of rows in the recent-loans feed.
pub const RECENT_LOANS_DEFAULT: u32 = 5;
/// Upper bound for the recent-loans feed.
pub const RECENT_LOANS_MAX: u32 = 20;

/// Clamp a requested feed length into `1..=RECENT_LOANS_MAX`.
pub fn recent_loans_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(RECENT_LOANS_DEFAULT)
        .clamp(1, RECENT_LOANS_MAX)
}

/// Read-only dashboard views over loan and user stores.
#[derive(Clone)]
pub struct DashboardService<L, U> {
    loans: Arc<L>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
    expander: LoanService<L, U>,
}

impl<L, U> DashboardService<L, U> {
    /// Create the service.
    pub fn new(loans: Arc<L>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        let expander = LoanService::new(Arc::clone(&loans), Arc::clone(&users), Arc::clone(&clock));
        Self {
            loans,
            users,
            clock,
            expander,
        }
    }
}

#[async_trait]
impl<L, U> DashboardQuery for DashboardService<L, U>
where
    L: LoanRepository,
    U: UserRepository,
{
    async fn stats(&self, viewer: &User) -> Result<DashboardStats, Error> {
        let viewer = authorize(Some(viewer), Operation::ViewDashboard)?;
        let now = self.clock.utc();

        let totals = self.loans.totals().await.map_err(map_loan_repository_error)?;
        let recent = self
            .loans
            .count_created_since(recent_window_start(now))
            .await
            .map_err(map_loan_repository_error)?;
        let activity = self
            .loans
            .monthly_activity(trend_window_start(now))
            .await
            .map_err(map_loan_repository_error)?;
        let users = match viewer.role {
            Role::Admin => Some(
                self.users
                    .counts()
                    .await
                    .map_err(map_user_repository_error)?,
            ),
            Role::Verifier => None,
        };

        Ok(DashboardStats::assemble(
            &totals,
            recent,
            monthly_trends(now, &activity),
            users,
        ))
    }

    async fn recent_loans(
        &self,
        viewer: &User,
        limit: Option<u32>,
    ) -> Result<Vec<LoanView>, Error> {
        let viewer = authorize(Some(viewer), Operation::ViewDashboard)?;
        let loans = self
            .loans
            .recent(visible_status(viewer, None), recent_loans_limit(limit))
            .await
            .map_err(map_loan_repository_error)?;
        self.expander.expand(loans).await
    }

    async fn my_activity(&self, viewer: &User) -> Result<MyActivity, Error> {
        let viewer = authorize(Some(viewer), Operation::ViewDashboard)?;
        let stage = match viewer.role {
            Role::Verifier => ReviewStage::Verification,
            Role::Admin => ReviewStage::Approval,
        };
        let today = start_of_day(self.clock.utc());

        let decided_today = self
            .loans
            .count_decisions(&viewer.id, stage, Some(today))
            .await
            .map_err(map_loan_repository_error)?;
        let decided_total = self
            .loans
            .count_decisions(&viewer.id, stage, None)
            .await
            .map_err(map_loan_repository_error)?;
        let queue = self
            .loans
            .totals()
            .await
            .map_err(map_loan_repository_error)?
            .counts
            .get(stage.source());

        Ok(match stage {
            ReviewStage::Verification => MyActivity::Verifier {
                verified_today: decided_today,
                total_verified: decided_total,
                pending_count: queue,
            },
            ReviewStage::Approval => MyActivity::Admin {
                approved_today: decided_today,
                total_approved: decided_total,
                pending_verified: queue,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use mockall::predicate::eq;
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::LoanStatus;
    use crate::domain::ports::{
        LoanTotals, MockLoanRepository, MockUserRepository, MonthlyActivity, StatusCounts,
        UserCounts,
    };
    use crate::test_support::{MutableClock, fixed_now, sample_loan, user_with_role};

    fn service(
        loans: MockLoanRepository,
        users: MockUserRepository,
    ) -> DashboardService<MockLoanRepository, MockUserRepository> {
        DashboardService::new(
            Arc::new(loans),
            Arc::new(users),
            Arc::new(MutableClock::new(fixed_now())),
        )
    }

    fn totals() -> LoanTotals {
        LoanTotals {
            counts: StatusCounts {
                pending: 2,
                verified: 1,
                approved: 1,
                rejected: 0,
            },
            total_amount: 20_000.0,
            approved_amount: 5_000.0,
        }
    }

    fn loans_with_aggregates() -> MockLoanRepository {
        let mut loans = MockLoanRepository::new();
        loans.expect_totals().return_once(|| Ok(totals()));
        loans
            .expect_count_created_since()
            .with(eq(recent_window_start(fixed_now())))
            .return_once(|_| Ok(3));
        loans.expect_monthly_activity().return_once(|_| {
            Ok(vec![MonthlyActivity {
                year: 2025,
                month: 3,
                applications: 4,
                total_amount: 20_000.0,
                approved: 1,
            }])
        });
        loans
    }

    #[rstest]
    #[case(None, 5)]
    #[case(Some(0), 1)]
    #[case(Some(7), 7)]
    #[case(Some(500), 20)]
    fn recent_limit_is_clamped(#[case] requested: Option<u32>, #[case] expected: u32) {
        assert_eq!(recent_loans_limit(requested), expected);
    }

    #[tokio::test]
    async fn admin_stats_include_user_counts() {
        let mut users = MockUserRepository::new();
        users.expect_counts().times(1).return_once(|| {
            Ok(UserCounts {
                total: 3,
                active: 2,
                inactive: 1,
                admins: 1,
                verifiers: 2,
            })
        });

        let stats = service(loans_with_aggregates(), users)
            .stats(&user_with_role(Role::Admin))
            .await
            .expect("stats");

        assert_eq!(stats.total_loans, 4);
        assert!((stats.by_status.pending.percentage - 50.0).abs() < f64::EPSILON);
        assert_eq!(stats.recent_applications, 3);
        assert_eq!(stats.monthly_trends.len(), 6);
        assert_eq!(stats.users.map(|u| u.total), Some(3));
    }

    #[tokio::test]
    async fn verifier_stats_omit_user_counts() {
        let mut users = MockUserRepository::new();
        users.expect_counts().times(0);

        let stats = service(loans_with_aggregates(), users)
            .stats(&user_with_role(Role::Verifier))
            .await
            .expect("stats");

        assert!(stats.users.is_none());
    }

    #[tokio::test]
    async fn verifier_recent_feed_is_pending_only() {
        let mut loans = MockLoanRepository::new();
        loans
            .expect_recent()
            .with(eq(Some(LoanStatus::Pending)), eq(RECENT_LOANS_DEFAULT))
            .times(1)
            .return_once(|_, _| Ok(vec![sample_loan(LoanStatus::Pending)]));

        let feed = service(loans, MockUserRepository::new())
            .recent_loans(&user_with_role(Role::Verifier), None)
            .await
            .expect("feed");

        assert_eq!(feed.len(), 1);
    }

    #[tokio::test]
    async fn admin_recent_feed_is_unfiltered_and_clamped() {
        let mut loans = MockLoanRepository::new();
        loans
            .expect_recent()
            .with(eq(None::<LoanStatus>), eq(RECENT_LOANS_MAX))
            .return_once(|_, _| Ok(Vec::new()));

        let feed = service(loans, MockUserRepository::new())
            .recent_loans(&user_with_role(Role::Admin), Some(99))
            .await
            .expect("feed");

        assert!(feed.is_empty());
    }

    #[tokio::test]
    async fn verifier_activity_counts_verification_decisions() {
        let verifier = user_with_role(Role::Verifier);
        let mut loans = MockLoanRepository::new();
        loans
            .expect_count_decisions()
            .with(
                eq(verifier.id),
                eq(ReviewStage::Verification),
                eq(Some(start_of_day(fixed_now()))),
            )
            .return_once(|_, _, _| Ok(1));
        loans
            .expect_count_decisions()
            .with(eq(verifier.id), eq(ReviewStage::Verification), eq(None::<DateTime<Utc>>))
            .return_once(|_, _, _| Ok(4));
        loans.expect_totals().return_once(|| Ok(totals()));

        let activity = service(loans, MockUserRepository::new())
            .my_activity(&verifier)
            .await
            .expect("activity");

        assert_eq!(
            activity,
            MyActivity::Verifier {
                verified_today: 1,
                total_verified: 4,
                pending_count: 2,
            }
        );
    }

    #[tokio::test]
    async fn admin_activity_reports_verified_queue() {
        let admin = user_with_role(Role::Admin);
        let mut loans = MockLoanRepository::new();
        loans
            .expect_count_decisions()
            .withf(|_, stage, since| *stage == ReviewStage::Approval && since.is_some())
            .return_once(|_, _, _| Ok(0));
        loans
            .expect_count_decisions()
            .withf(|_, stage, since| *stage == ReviewStage::Approval && since.is_none())
            .return_once(|_, _, _| Ok(2));
        loans.expect_totals().return_once(|| Ok(totals()));

        let activity = service(loans, MockUserRepository::new())
            .my_activity(&admin)
            .await
            .expect("activity");

        assert_eq!(
            activity,
            MyActivity::Admin {
                approved_today: 0,
                total_approved: 2,
                pending_verified: 1,
            }
        );
    }

    #[tokio::test]
    async fn store_outage_is_service_unavailable() {
        let mut loans = MockLoanRepository::new();
        loans
            .expect_totals()
            .return_once(|| Err(crate::domain::ports::LoanRepositoryError::connection("down")));

        let err = service(loans, MockUserRepository::new())
            .stats(&user_with_role(Role::Admin))
            .await
            .expect_err("outage");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
