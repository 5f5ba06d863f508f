//! PostgreSQL-backed `LoanRepository` implementation using Diesel ORM.
//!
//! Status transitions are a single `UPDATE ... WHERE id = $1 AND status = $2
//! RETURNING *`. When no row comes back a follow-up read tells a missing loan
//! apart from one whose status has moved on.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Timestamptz;
use diesel_async::RunQueryDsl;
use pagination::PageRequest;

use crate::domain::loan::{ReviewStage, TransitionPlan};
use crate::domain::ports::{
    LoanListFilter, LoanRepository, LoanRepositoryError, LoanTotals, MonthlyActivity,
    TransitionOutcome,
};
use crate::domain::{
    EmailAddress, EmploymentStatus, Loan, LoanDocument, LoanId, LoanStatus, PersonName, UserId,
};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, unique_violation_constraint,
};
use super::models::{ApprovalUpdate, LoanRow, MonthlyActivityRow, NewLoanRow, VerificationUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::loans;

const OPEN_APPLICATION_INDEX: &str = "loans_open_application_per_email";
const OPEN_STATUSES: [&str; 2] = ["pending", "verified"];

const MONTHLY_ACTIVITY_SQL: &str = "\
SELECT EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::int AS year, \
       EXTRACT(MONTH FROM created_at AT TIME ZONE 'UTC')::int AS month, \
       COUNT(*) AS applications, \
       COALESCE(SUM(amount), 0)::double precision AS total_amount, \
       COUNT(*) FILTER (WHERE status = 'approved') AS approved \
FROM loans \
WHERE created_at >= $1 \
GROUP BY 1, 2 \
ORDER BY 1, 2";

/// Diesel-backed implementation of the loan repository port.
#[derive(Clone)]
pub struct DieselLoanRepository {
    pool: DbPool,
}

impl DieselLoanRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> LoanRepositoryError {
    map_basic_pool_error(error, LoanRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> LoanRepositoryError {
    map_basic_diesel_error(
        error,
        LoanRepositoryError::query,
        LoanRepositoryError::connection,
    )
}

fn map_insert_error(error: diesel::result::Error, email: &EmailAddress) -> LoanRepositoryError {
    match unique_violation_constraint(&error) {
        Some(OPEN_APPLICATION_INDEX) => {
            LoanRepositoryError::duplicate_open_application(email.as_ref())
        }
        _ => map_diesel_error(error),
    }
}

fn corrupt(field: &str, err: impl std::fmt::Display) -> LoanRepositoryError {
    LoanRepositoryError::query(format!("invalid {field} in loans table: {err}"))
}

fn row_to_loan(row: LoanRow) -> Result<Loan, LoanRepositoryError> {
    let LoanRow {
        id,
        applicant_name,
        email,
        phone,
        amount,
        purpose,
        employment_status,
        monthly_income,
        credit_score,
        status,
        verified_by,
        verified_at,
        approved_by,
        approved_at,
        rejection_reason,
        documents,
        created_at,
        updated_at,
    } = row;

    let credit_score = credit_score
        .map(u16::try_from)
        .transpose()
        .map_err(|err| corrupt("credit_score", err))?;
    let documents: Vec<LoanDocument> =
        serde_json::from_value(documents).map_err(|err| corrupt("documents", err))?;

    Ok(Loan {
        id: LoanId::from_uuid(id),
        applicant_name: PersonName::new(&applicant_name)
            .map_err(|err| corrupt("applicant_name", err))?,
        email: EmailAddress::new(&email).map_err(|err| corrupt("email", err))?,
        phone,
        amount,
        purpose,
        employment_status: EmploymentStatus::from_str(&employment_status)
            .map_err(|err| corrupt("employment_status", err))?,
        monthly_income,
        credit_score,
        status: parse_status(&status)?,
        verified_by: verified_by.map(UserId::from_uuid),
        verified_at,
        approved_by: approved_by.map(UserId::from_uuid),
        approved_at,
        rejection_reason,
        documents,
        created_at,
        updated_at,
    })
}

fn parse_status(raw: &str) -> Result<LoanStatus, LoanRepositoryError> {
    LoanStatus::from_str(raw).map_err(|err| corrupt("status", err))
}

fn rows_to_loans(rows: Vec<LoanRow>) -> Result<Vec<Loan>, LoanRepositoryError> {
    rows.into_iter().map(row_to_loan).collect()
}

fn row_to_activity(row: MonthlyActivityRow) -> Result<MonthlyActivity, LoanRepositoryError> {
    Ok(MonthlyActivity {
        year: row.year,
        month: u32::try_from(row.month).map_err(|err| corrupt("month", err))?,
        applications: to_u64(row.applications),
        total_amount: row.total_amount,
        approved: to_u64(row.approved),
    })
}

/// `ILIKE` pattern matching `needle` anywhere, with wildcards escaped.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn filtered(filter: &LoanListFilter) -> loans::BoxedQuery<'static, Pg> {
    let mut query = loans::table.into_boxed();
    if let Some(status) = filter.status {
        query = query.filter(loans::status.eq(status.as_str()));
    }
    if let Some(search) = filter.search.as_deref() {
        let pattern = contains_pattern(search);
        query = query.filter(
            loans::applicant_name
                .ilike(pattern.clone())
                .or(loans::email.ilike(pattern.clone()))
                .or(loans::purpose.ilike(pattern)),
        );
    }
    query
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

#[async_trait]
impl LoanRepository for DieselLoanRepository {
    async fn insert(&self, loan: &Loan) -> Result<(), LoanRepositoryError> {
        let documents = serde_json::to_value(&loan.documents)
            .map_err(|err| LoanRepositoryError::query(format!("serialise documents: {err}")))?;
        let row = NewLoanRow {
            id: *loan.id.as_uuid(),
            applicant_name: loan.applicant_name.as_ref(),
            email: loan.email.as_ref(),
            phone: &loan.phone,
            amount: loan.amount,
            purpose: &loan.purpose,
            employment_status: loan.employment_status.as_str(),
            monthly_income: loan.monthly_income,
            credit_score: loan.credit_score.map(i32::from),
            status: loan.status.as_str(),
            documents: &documents,
            created_at: loan.created_at,
            updated_at: loan.updated_at,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(loans::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_insert_error(err, &loan.email))
    }

    async fn find_open_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Loan>, LoanRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        loans::table
            .filter(loans::email.eq(email.as_ref()))
            .filter(loans::status.eq_any(OPEN_STATUSES))
            .select(LoanRow::as_select())
            .first::<LoanRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_loan)
            .transpose()
    }

    async fn find_by_id(&self, id: &LoanId) -> Result<Option<Loan>, LoanRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        loans::table
            .find(*id.as_uuid())
            .select(LoanRow::as_select())
            .first::<LoanRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_loan)
            .transpose()
    }

    async fn list(
        &self,
        filter: &LoanListFilter,
        page: PageRequest,
    ) -> Result<(Vec<Loan>, u64), LoanRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<LoanRow> = filtered(filter)
            .order((loans::created_at.desc(), loans::id.desc()))
            .limit(i64::from(page.limit()))
            .offset(to_i64(page.offset()))
            .select(LoanRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok((rows_to_loans(rows)?, to_u64(total)))
    }

    async fn transition(
        &self,
        id: &LoanId,
        plan: &TransitionPlan,
    ) -> Result<TransitionOutcome, LoanRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let guarded = loans::table
            .filter(loans::id.eq(*id.as_uuid()))
            .filter(loans::status.eq(plan.expected.as_str()));
        let status = plan.next.as_str();
        let actor = *plan.actor.as_uuid();
        let rejection_reason = plan.rejection_reason.as_deref();

        let updated = match plan.stage {
            ReviewStage::Verification => {
                diesel::update(guarded)
                    .set(&VerificationUpdate {
                        status,
                        verified_by: actor,
                        verified_at: plan.at,
                        rejection_reason,
                        updated_at: plan.at,
                    })
                    .returning(LoanRow::as_returning())
                    .get_result::<LoanRow>(&mut conn)
                    .await
            }
            ReviewStage::Approval => {
                diesel::update(guarded)
                    .set(&ApprovalUpdate {
                        status,
                        approved_by: actor,
                        approved_at: plan.at,
                        rejection_reason,
                        updated_at: plan.at,
                    })
                    .returning(LoanRow::as_returning())
                    .get_result::<LoanRow>(&mut conn)
                    .await
            }
        }
        .optional()
        .map_err(map_diesel_error)?;

        if let Some(row) = updated {
            return row_to_loan(row).map(TransitionOutcome::Applied);
        }

        let actual: Option<String> = loans::table
            .find(*id.as_uuid())
            .select(loans::status)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        match actual {
            None => Ok(TransitionOutcome::Missing),
            Some(raw) => Ok(TransitionOutcome::StatusMismatch {
                actual: parse_status(&raw)?,
            }),
        }
    }

    async fn totals(&self) -> Result<LoanTotals, LoanRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let groups: Vec<(String, i64, Option<f64>)> = loans::table
            .group_by(loans::status)
            .select((loans::status, count_star(), diesel::dsl::sum(loans::amount)))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        groups
            .into_iter()
            .try_fold(LoanTotals::default(), |mut totals, (raw, count, amount)| {
                let status = parse_status(&raw)?;
                let amount = amount.unwrap_or_default();
                totals.counts.add(status, to_u64(count));
                totals.total_amount += amount;
                if status == LoanStatus::Approved {
                    totals.approved_amount += amount;
                }
                Ok(totals)
            })
    }

    async fn count_created_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<u64, LoanRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        loans::table
            .filter(loans::created_at.ge(since))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map(to_u64)
            .map_err(map_diesel_error)
    }

    async fn monthly_activity(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MonthlyActivity>, LoanRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MonthlyActivityRow> = diesel::sql_query(MONTHLY_ACTIVITY_SQL)
            .bind::<Timestamptz, _>(since)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_activity).collect()
    }

    async fn count_decisions(
        &self,
        actor: &UserId,
        stage: ReviewStage,
        since: Option<DateTime<Utc>>,
    ) -> Result<u64, LoanRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let actor = *actor.as_uuid();
        let mut query = loans::table.into_boxed::<Pg>();
        query = match stage {
            ReviewStage::Verification => {
                let query = query.filter(loans::verified_by.eq(actor));
                match since {
                    Some(since) => query.filter(loans::verified_at.ge(since)),
                    None => query,
                }
            }
            ReviewStage::Approval => {
                let query = query.filter(loans::approved_by.eq(actor));
                match since {
                    Some(since) => query.filter(loans::approved_at.ge(since)),
                    None => query,
                }
            }
        };
        query
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map(to_u64)
            .map_err(map_diesel_error)
    }

    async fn recent(
        &self,
        status: Option<LoanStatus>,
        limit: u32,
    ) -> Result<Vec<Loan>, LoanRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let filter = LoanListFilter {
            status,
            search: None,
        };
        let rows: Vec<LoanRow> = filtered(&filter)
            .order((loans::created_at.desc(), loans::id.desc()))
            .limit(i64::from(limit))
            .select(LoanRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_loans(rows)
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion and error mapping coverage.

    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::{fixture, rstest};
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::test_support::fixed_now;

    #[fixture]
    fn valid_row() -> LoanRow {
        LoanRow {
            id: Uuid::new_v4(),
            applicant_name: "Jane Doe".to_owned(),
            email: "jane@x.com".to_owned(),
            phone: "+1 555 0100".to_owned(),
            amount: 25_000.0,
            purpose: "Home improvement".to_owned(),
            employment_status: "self-employed".to_owned(),
            monthly_income: 4_200.0,
            credit_score: Some(710),
            status: "verified".to_owned(),
            verified_by: Some(Uuid::new_v4()),
            verified_at: Some(fixed_now()),
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            documents: json!([{ "name": "payslip.pdf", "url": "https://docs.test/payslip.pdf" }]),
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    #[rstest]
    fn valid_row_converts(valid_row: LoanRow) {
        let verifier = valid_row.verified_by;
        let loan = row_to_loan(valid_row).expect("valid row");

        assert_eq!(loan.status, LoanStatus::Verified);
        assert_eq!(loan.employment_status, EmploymentStatus::SelfEmployed);
        assert_eq!(loan.credit_score, Some(710));
        assert_eq!(loan.verified_by.map(|id| *id.as_uuid()), verifier);
        assert_eq!(loan.documents[0].name, "payslip.pdf");
    }

    #[rstest]
    #[case::status("status")]
    #[case::employment("employment_status")]
    #[case::documents("documents")]
    #[case::credit_score("credit_score")]
    fn corrupt_column_is_a_query_error(mut valid_row: LoanRow, #[case] column: &str) {
        match column {
            "status" => valid_row.status = "archived".to_owned(),
            "employment_status" => valid_row.employment_status = "freelance".to_owned(),
            "documents" => valid_row.documents = json!({ "not": "a list" }),
            _ => valid_row.credit_score = Some(-1),
        }

        let err = row_to_loan(valid_row).expect_err("corrupt row");

        assert!(matches!(err, LoanRepositoryError::Query { .. }));
        assert!(err.to_string().contains(column));
    }

    #[rstest]
    #[case("jane", "%jane%")]
    #[case("50%_off", "%50\\%\\_off%")]
    fn search_patterns_escape_wildcards(#[case] needle: &str, #[case] expected: &str) {
        assert_eq!(contains_pattern(needle), expected);
    }

    #[rstest]
    fn unrelated_unique_violation_is_not_a_duplicate() {
        let email = EmailAddress::new("jane@x.com").expect("email");
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_owned()),
        );

        let mapped = map_insert_error(error, &email);

        assert!(matches!(mapped, LoanRepositoryError::Query { .. }));
    }

    #[rstest]
    fn negative_month_is_rejected() {
        let row = MonthlyActivityRow {
            year: 2025,
            month: -1,
            applications: 1,
            total_amount: 1_000.0,
            approved: 0,
        };
        assert!(row_to_activity(row).is_err());
    }
}
