//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{loans, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Projection used to expand actor references.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserSummaryRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
    pub role: &'a str,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the loans table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = loans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LoanRow {
    pub id: Uuid,
    pub applicant_name: String,
    pub email: String,
    pub phone: String,
    pub amount: f64,
    pub purpose: String,
    pub employment_status: String,
    pub monthly_income: f64,
    pub credit_score: Option<i32>,
    pub status: String,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub documents: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for new loan applications.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = loans)]
pub(crate) struct NewLoanRow<'a> {
    pub id: Uuid,
    pub applicant_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub amount: f64,
    pub purpose: &'a str,
    pub employment_status: &'a str,
    pub monthly_income: f64,
    pub credit_score: Option<i32>,
    pub status: &'a str,
    pub documents: &'a serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset written by a verification decision.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = loans)]
pub(crate) struct VerificationUpdate<'a> {
    pub status: &'a str,
    pub verified_by: Uuid,
    pub verified_at: DateTime<Utc>,
    pub rejection_reason: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset written by an approval decision.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = loans)]
pub(crate) struct ApprovalUpdate<'a> {
    pub status: &'a str,
    pub approved_by: Uuid,
    pub approved_at: DateTime<Utc>,
    pub rejection_reason: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

/// One month of loan activity, read through a raw aggregate query.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct MonthlyActivityRow {
    #[diesel(sql_type = diesel::sql_types::Integer)]
    pub year: i32,
    #[diesel(sql_type = diesel::sql_types::Integer)]
    pub month: i32,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub applications: i64,
    #[diesel(sql_type = diesel::sql_types::Double)]
    pub total_amount: f64,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub approved: i64,
}
