//! Dashboard views derived from loan and user aggregates.
//!
//! Everything here is a pure function of repository aggregates and the
//! current time, so the rules (percentage rounding, month bucketing, day
//! boundaries) are tested without a store.

use chrono::{DateTime, Datelike, Months, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::Serialize;

use super::LoanStatus;
use super::ports::{LoanTotals, MonthlyActivity, StatusCounts, UserCounts};

/// Number of calendar months in the trend series, current month included.
pub const TREND_MONTHS: u32 = 6;
/// Width of the "recent applications" window.
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Count and share of one status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusShare {
    /// Loans in the status.
    pub count: u64,
    /// Share of all loans, in percent, rounded to one decimal.
    pub percentage: f64,
}

/// Per-status breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusBreakdown {
    /// Pending loans.
    pub pending: StatusShare,
    /// Verified loans.
    pub verified: StatusShare,
    /// Approved loans.
    pub approved: StatusShare,
    /// Rejected loans.
    pub rejected: StatusShare,
}

impl StatusBreakdown {
    /// Derive shares from raw counts. All percentages are zero when there
    /// are no loans.
    ///
    /// # Examples
    /// ```
    /// use loan_backend::domain::dashboard::StatusBreakdown;
    /// use loan_backend::domain::ports::StatusCounts;
    ///
    /// let breakdown = StatusBreakdown::from_counts(&StatusCounts {
    ///     pending: 1,
    ///     verified: 1,
    ///     approved: 1,
    ///     rejected: 0,
    /// });
    /// assert_eq!(breakdown.pending.percentage, 33.3);
    /// assert_eq!(breakdown.rejected.percentage, 0.0);
    /// ```
    pub fn from_counts(counts: &StatusCounts) -> Self {
        let total = counts.total();
        let share = |status: LoanStatus| {
            let count = counts.get(status);
            StatusShare {
                count,
                percentage: percentage(count, total),
            }
        };
        Self {
            pending: share(LoanStatus::Pending),
            verified: share(LoanStatus::Verified),
            approved: share(LoanStatus::Approved),
            rejected: share(LoanStatus::Rejected),
        }
    }
}

fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let ratio = count as f64 / total as f64;
    (ratio * 1_000.0).round() / 10.0
}

/// Activity in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    /// Month in `YYYY-MM` form.
    pub month: String,
    /// Applications submitted.
    pub applications: u64,
    /// Sum of requested amounts.
    pub total_amount: f64,
    /// Applications from the month that are now approved.
    pub approved: u64,
}

/// Store-wide dashboard statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// All loans.
    pub total_loans: u64,
    /// Per-status counts and shares.
    pub by_status: StatusBreakdown,
    /// Sum of all requested amounts.
    pub total_amount: f64,
    /// Sum of approved amounts.
    pub approved_amount: f64,
    /// Applications submitted in the trailing window.
    pub recent_applications: u64,
    /// Chronological monthly series.
    pub monthly_trends: Vec<MonthlyTrend>,
    /// Head counts, admins only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<UserCounts>,
}

impl DashboardStats {
    /// Assemble the statistics view.
    pub fn assemble(
        totals: &LoanTotals,
        recent_applications: u64,
        monthly_trends: Vec<MonthlyTrend>,
        users: Option<UserCounts>,
    ) -> Self {
        Self {
            total_loans: totals.counts.total(),
            by_status: StatusBreakdown::from_counts(&totals.counts),
            total_amount: totals.total_amount,
            approved_amount: totals.approved_amount,
            recent_applications,
            monthly_trends,
            users,
        }
    }
}

/// Per-identity activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum MyActivity {
    /// Verification activity.
    Verifier {
        /// Decisions taken since UTC midnight.
        verified_today: u64,
        /// Decisions taken overall.
        total_verified: u64,
        /// Loans awaiting verification.
        pending_count: u64,
    },
    /// Approval activity.
    Admin {
        /// Decisions taken since UTC midnight.
        approved_today: u64,
        /// Decisions taken overall.
        total_approved: u64,
        /// Loans awaiting an approval decision.
        pending_verified: u64,
    },
}

/// Start of the UTC day containing `now`.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Start of the trailing "recent applications" window.
pub fn recent_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - TimeDelta::days(RECENT_WINDOW_DAYS)
}

/// First instant of the oldest month in the trend series.
pub fn trend_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let first_of_month = first_of_month(now);
    first_of_month
        .checked_sub_months(Months::new(TREND_MONTHS - 1))
        .unwrap_or(first_of_month)
}

fn first_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or_else(|| start_of_day(now))
}

/// Build the chronological trend series ending with the month of `now`.
///
/// Months missing from `activity` are reported with zero counts.
pub fn monthly_trends(now: DateTime<Utc>, activity: &[MonthlyActivity]) -> Vec<MonthlyTrend> {
    let start = trend_window_start(now);
    (0..TREND_MONTHS)
        .filter_map(|offset| start.checked_add_months(Months::new(offset)))
        .map(|month_start| {
            let (year, month) = (month_start.year(), month_start.month());
            let found = activity
                .iter()
                .find(|row| row.year == year && row.month == month);
            MonthlyTrend {
                month: format!("{year:04}-{month:02}"),
                applications: found.map_or(0, |row| row.applications),
                total_amount: found.map_or(0.0, |row| row.total_amount),
                approved: found.map_or(0, |row| row.approved),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixed_now;
    use rstest::rstest;

    #[rstest]
    fn zero_total_reports_zero_percentages() {
        let breakdown = StatusBreakdown::from_counts(&StatusCounts::default());
        for share in [
            breakdown.pending,
            breakdown.verified,
            breakdown.approved,
            breakdown.rejected,
        ] {
            assert_eq!(share.count, 0);
            assert!(share.percentage.abs() < f64::EPSILON);
        }
    }

    #[rstest]
    #[case(1, 1, 1, 0)]
    #[case(3, 0, 0, 0)]
    #[case(2, 3, 5, 7)]
    #[case(1, 1, 1, 4)]
    fn percentages_sum_to_one_hundred_within_rounding(
        #[case] pending: u64,
        #[case] verified: u64,
        #[case] approved: u64,
        #[case] rejected: u64,
    ) {
        let breakdown = StatusBreakdown::from_counts(&StatusCounts {
            pending,
            verified,
            approved,
            rejected,
        });
        let sum = breakdown.pending.percentage
            + breakdown.verified.percentage
            + breakdown.approved.percentage
            + breakdown.rejected.percentage;
        assert!((sum - 100.0).abs() <= 0.2, "sum was {sum}");
    }

    #[rstest]
    fn trends_cover_six_months_in_order_with_zero_fill() {
        let now = fixed_now();
        let activity = [
            MonthlyActivity {
                year: 2025,
                month: 3,
                applications: 4,
                total_amount: 20_000.0,
                approved: 1,
            },
            MonthlyActivity {
                year: 2024,
                month: 11,
                applications: 2,
                total_amount: 3_000.0,
                approved: 0,
            },
        ];
        let trends = monthly_trends(now, &activity);
        let months: Vec<_> = trends.iter().map(|t| t.month.as_str()).collect();
        assert_eq!(
            months,
            ["2024-10", "2024-11", "2024-12", "2025-01", "2025-02", "2025-03"]
        );
        let applications: Vec<_> = trends.iter().map(|t| t.applications).collect();
        assert_eq!(applications, [0, 2, 0, 0, 0, 4]);
    }

    #[rstest]
    fn window_boundaries() {
        let now = fixed_now();
        assert_eq!(start_of_day(now).to_rfc3339(), "2025-03-15T00:00:00+00:00");
        assert_eq!(
            trend_window_start(now).to_rfc3339(),
            "2024-10-01T00:00:00+00:00"
        );
        assert_eq!(
            recent_window_start(now).to_rfc3339(),
            "2025-02-13T12:00:00+00:00"
        );
    }

    #[rstest]
    fn activity_serialises_with_role_tag() {
        let activity = MyActivity::Verifier {
            verified_today: 1,
            total_verified: 4,
            pending_count: 2,
        };
        let value = serde_json::to_value(activity).expect("serialise");
        assert_eq!(
            value,
            serde_json::json!({
                "role": "verifier",
                "verifiedToday": 1,
                "totalVerified": 4,
                "pendingCount": 2,
            })
        );
    }
}
