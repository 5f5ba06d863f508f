//! Domain primitives, aggregates and services.
//!
//! Purpose: define strongly typed entities for staff users and loan
//! applications, the role policy, the review lifecycle and the dashboard
//! aggregates. Services implement the driving ports in [`ports`] on top of
//! the driven ports, so inbound adapters never touch storage directly.
//!
//! Public surface:
//! - Error / ErrorCode: API error payload and stable identifiers.
//! - User / Role / UserAccount: staff identities.
//! - Loan / LoanStatus / LoanView: loan applications and their expanded view.
//! - authorize / Operation: the role policy table.
//! - LoanService, UserAdminService, AuthService, DashboardService.

pub mod auth;
pub mod authorization;
pub mod dashboard;
pub mod email;
pub mod error;
pub mod loan;
pub mod ports;
pub mod trace_id;
pub mod user;

mod auth_service;
mod dashboard_service;
mod loan_service;
mod user_admin_service;

pub use self::auth::{
    IssuedToken, LoginCredentials, LoginOutcome, LoginValidationError, NewPassword,
    PASSWORD_MIN, PasswordValidationError, TokenSubject,
};
pub use self::auth_service::AuthService;
pub use self::authorization::{Operation, authorize};
pub use self::dashboard_service::{
    DashboardService, RECENT_LOANS_DEFAULT, RECENT_LOANS_MAX, recent_loans_limit,
};
pub use self::email::{EmailAddress, EmailValidationError};
pub use self::error::{Error, ErrorCode, ErrorValidationError, FieldViolation, TRACE_ID_HEADER};
pub use self::loan::{
    ActorReference, EmploymentStatus, Loan, LoanDocument, LoanId, LoanStatus, LoanValueError,
    LoanView, SubmittedLoan,
};
pub use self::loan_service::LoanService;
pub use self::trace_id::TraceId;
pub use self::user::{
    PersonName, Role, User, UserAccount, UserId, UserSummary, UserValidationError,
};
pub use self::user_admin_service::UserAdminService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use loan_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
