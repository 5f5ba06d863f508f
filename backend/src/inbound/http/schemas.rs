//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. The
//! wrappers here mirror the serialised shape of their domain counterparts
//! and exist only so utoipa can describe request and response bodies.

#![expect(
    dead_code,
    reason = "Schema wrappers are only read by utoipa's derive output"
)]

use utoipa::ToSchema;

/// Stable machine-readable error codes returned in failure envelopes.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// The loan is not in the state the action requires.
    #[schema(rename = "invalid_transition")]
    InvalidTransition,
    /// An open application already exists for the email.
    #[schema(rename = "duplicate_application")]
    DuplicateApplication,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The loan changed while the request was in flight.
    #[schema(rename = "conflict")]
    Conflict,
    /// A backing store is unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// One rejected input field.
#[derive(ToSchema)]
#[schema(as = crate::domain::FieldViolation)]
pub struct FieldViolationSchema {
    #[schema(example = "amount")]
    field: String,
    #[schema(example = "out_of_range")]
    code: String,
    #[schema(example = "amount must be between 1000 and 10000000")]
    message: String,
}

/// Failure envelope.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
pub struct ErrorSchema {
    /// Always `false`.
    success: bool,
    code: ErrorCodeSchema,
    #[schema(example = "Validation failed")]
    message: String,
    /// Present for validation failures.
    errors: Option<Vec<FieldViolationSchema>>,
    /// Correlation identifier, also sent in the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
}

/// Staff role.
#[derive(ToSchema)]
#[schema(as = crate::domain::Role, rename_all = "lowercase")]
pub enum RoleSchema {
    Admin,
    Verifier,
}

/// Staff user. Password material is never serialised.
#[derive(ToSchema)]
#[schema(as = crate::domain::User, rename_all = "camelCase")]
pub struct UserSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(example = "Ada Lovelace")]
    name: String,
    #[schema(example = "ada@bank.test")]
    email: String,
    role: RoleSchema,
    is_active: bool,
    #[schema(value_type = Option<String>, format = DateTime)]
    last_login_at: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
    #[schema(value_type = String, format = DateTime)]
    updated_at: String,
}

/// Display form of a deciding user. Only `id` is present when the user
/// record no longer exists.
#[derive(ToSchema)]
#[schema(as = crate::domain::ActorReference)]
pub struct ActorReferenceSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    name: Option<String>,
    email: Option<String>,
}

/// Loan lifecycle status.
#[derive(ToSchema)]
#[schema(as = crate::domain::LoanStatus, rename_all = "lowercase")]
pub enum LoanStatusSchema {
    Pending,
    Verified,
    Approved,
    Rejected,
}

/// Applicant employment situation.
#[derive(ToSchema)]
#[schema(as = crate::domain::EmploymentStatus, rename_all = "kebab-case")]
pub enum EmploymentStatusSchema {
    Employed,
    SelfEmployed,
    Unemployed,
    Retired,
}

/// Supporting document reference.
#[derive(ToSchema)]
#[schema(as = crate::domain::LoanDocument)]
pub struct LoanDocumentSchema {
    name: String,
    url: String,
}

/// Loan application with decision actors expanded.
#[derive(ToSchema)]
#[schema(as = crate::domain::LoanView, rename_all = "camelCase")]
pub struct LoanViewSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(example = "Jane Doe")]
    applicant_name: String,
    #[schema(example = "jane@x.com")]
    email: String,
    phone: String,
    #[schema(example = 5000.0)]
    amount: f64,
    purpose: String,
    employment_status: EmploymentStatusSchema,
    monthly_income: f64,
    credit_score: Option<u16>,
    status: LoanStatusSchema,
    verified_by: Option<ActorReferenceSchema>,
    #[schema(value_type = Option<String>, format = DateTime)]
    verified_at: Option<String>,
    approved_by: Option<ActorReferenceSchema>,
    #[schema(value_type = Option<String>, format = DateTime)]
    approved_at: Option<String>,
    rejection_reason: Option<String>,
    documents: Vec<LoanDocumentSchema>,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
    #[schema(value_type = String, format = DateTime)]
    updated_at: String,
}

/// Document reference supplied with an application.
#[derive(ToSchema)]
#[schema(as = crate::domain::loan::DocumentForm)]
pub struct DocumentFormSchema {
    name: String,
    url: String,
}

/// Applicant submission body. Every field is validated and all violations
/// are reported together.
#[derive(ToSchema)]
#[schema(as = crate::domain::loan::ApplicationForm, rename_all = "camelCase")]
pub struct ApplicationFormSchema {
    #[schema(example = "Jane Doe", min_length = 2, max_length = 100)]
    applicant_name: String,
    #[schema(example = "jane@x.com")]
    email: String,
    #[schema(example = "+1 (555) 010-0100", min_length = 7, max_length = 20)]
    phone: String,
    #[schema(example = 5000.0, minimum = 1000.0, maximum = 10000000.0)]
    amount: f64,
    #[schema(example = "Home improvement", max_length = 500)]
    purpose: String,
    employment_status: EmploymentStatusSchema,
    #[schema(example = 4200.0, minimum = 0.0)]
    monthly_income: f64,
    #[schema(minimum = 300, maximum = 850)]
    credit_score: Option<u16>,
    documents: Option<Vec<DocumentFormSchema>>,
}

/// Result of a submission.
#[derive(ToSchema)]
#[schema(as = crate::domain::SubmittedLoan, rename_all = "camelCase")]
pub struct SubmittedLoanSchema {
    #[schema(value_type = String, format = Uuid)]
    loan_id: String,
    status: LoanStatusSchema,
}

/// Page metadata.
#[derive(ToSchema)]
#[schema(as = pagination::PageInfo, rename_all = "camelCase")]
pub struct PageInfoSchema {
    current_page: u32,
    total_pages: u64,
    total_items: u64,
    items_per_page: u32,
    has_next_page: bool,
    has_prev_page: bool,
}

/// Count and rounded share of one status.
#[derive(ToSchema)]
#[schema(as = crate::domain::dashboard::StatusShare)]
pub struct StatusShareSchema {
    count: u64,
    #[schema(example = 33.3)]
    percentage: f64,
}

/// Per-status breakdown.
#[derive(ToSchema)]
#[schema(as = crate::domain::dashboard::StatusBreakdown)]
pub struct StatusBreakdownSchema {
    pending: StatusShareSchema,
    verified: StatusShareSchema,
    approved: StatusShareSchema,
    rejected: StatusShareSchema,
}

/// One calendar month of activity.
#[derive(ToSchema)]
#[schema(as = crate::domain::dashboard::MonthlyTrend, rename_all = "camelCase")]
pub struct MonthlyTrendSchema {
    #[schema(example = "2025-03")]
    month: String,
    applications: u64,
    total_amount: f64,
    approved: u64,
}

/// Staff head counts.
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::UserCounts)]
pub struct UserCountsSchema {
    total: u64,
    active: u64,
    inactive: u64,
    admins: u64,
    verifiers: u64,
}

/// Dashboard statistics. `users` is only present for admins.
#[derive(ToSchema)]
#[schema(as = crate::domain::dashboard::DashboardStats, rename_all = "camelCase")]
pub struct DashboardStatsSchema {
    total_loans: u64,
    by_status: StatusBreakdownSchema,
    total_amount: f64,
    approved_amount: f64,
    recent_applications: u64,
    monthly_trends: Vec<MonthlyTrendSchema>,
    users: Option<UserCountsSchema>,
}

/// Caller's own review activity. Verifiers receive the `verified*` and
/// `pendingCount` fields, admins the `approved*` and `pendingVerified`
/// fields.
#[derive(ToSchema)]
#[schema(as = crate::domain::dashboard::MyActivity, rename_all = "camelCase")]
pub struct MyActivitySchema {
    role: RoleSchema,
    verified_today: Option<u64>,
    total_verified: Option<u64>,
    pending_count: Option<u64>,
    approved_today: Option<u64>,
    total_approved: Option<u64>,
    pending_verified: Option<u64>,
}

/// Issued bearer token and the authenticated user.
#[derive(ToSchema)]
#[schema(as = crate::domain::LoginOutcome, rename_all = "camelCase")]
pub struct LoginOutcomeSchema {
    token: String,
    #[schema(value_type = String, format = DateTime)]
    expires_at: String,
    user: UserSchema,
}
