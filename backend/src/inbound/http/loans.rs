//! Loan application endpoints.
//!
//! ```text
//! POST  /api/loans/apply
//! GET   /api/loans?status=pending&search=jane&page=1&limit=10
//! GET   /api/loans/{id}
//! PATCH /api/loans/{id}/verify {"action":"reject","rejectionReason":"..."}
//! ```
//!
//! Submission is public. Everything else needs a bearer token; role checks
//! and the verifier visibility rule live in the loan service.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, get, patch, post, web};
use pagination::{PageInfo, Paginated};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::loan::{ApplicationForm, ReviewStage};
use crate::domain::ports::{ListLoansRequest, ReviewRequest};
use crate::domain::{Error, LoanView};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope::{self, Envelope};
use crate::inbound::http::identity::Authenticated;
use crate::inbound::http::schemas::{
    ApplicationFormSchema, ErrorSchema, LoanViewSchema, PageInfoSchema, SubmittedLoanSchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_loan_id, parse_page, parse_status};

/// Query string for `GET /api/loans`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListLoansQuery {
    /// `pending`, `verified`, `approved` or `rejected`. Ignored for verifiers.
    pub status: Option<String>,
    /// Case-insensitive match on applicant name, email or purpose.
    pub search: Option<String>,
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size, clamped to 1..=100.
    pub limit: Option<u32>,
}

impl ListLoansQuery {
    pub(crate) fn into_request(self) -> Result<ListLoansRequest, Error> {
        Ok(ListLoansRequest {
            status: parse_status(self.status.as_deref())?,
            search: self
                .search
                .map(|term| term.trim().to_owned())
                .filter(|term| !term.is_empty()),
            page: parse_page(self.page, self.limit)?,
        })
    }
}

/// Review decision body shared by the verify and approve endpoints.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody {
    /// `verify`/`reject` at verification, `approve`/`reject` at approval.
    #[schema(example = "verify")]
    pub action: Option<String>,
    /// Required when rejecting.
    pub rejection_reason: Option<String>,
}

impl ReviewBody {
    pub(crate) fn into_request(self, raw_id: &str, stage: ReviewStage) -> Result<ReviewRequest, Error> {
        Ok(ReviewRequest {
            loan_id: parse_loan_id(raw_id)?,
            stage,
            action: self.action.unwrap_or_default(),
            rejection_reason: self.rejection_reason,
        })
    }
}

/// One page of loans.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoanPage {
    #[schema(value_type = Vec<LoanViewSchema>)]
    pub loans: Vec<LoanView>,
    #[schema(value_type = PageInfoSchema)]
    pub pagination: PageInfo,
}

impl From<Paginated<LoanView>> for LoanPage {
    fn from(page: Paginated<LoanView>) -> Self {
        Self {
            loans: page.items,
            pagination: page.pagination,
        }
    }
}

/// Submit a new application.
#[utoipa::path(
    post,
    path = "/api/loans/apply",
    request_body = ApplicationFormSchema,
    responses(
        (status = 201, description = "Application stored as pending", body = SubmittedLoanSchema),
        (status = 400, description = "Validation failed or an open application exists", body = ErrorSchema),
        (status = 503, description = "Loan store unavailable", body = ErrorSchema)
    ),
    tags = ["loans"],
    operation_id = "applyForLoan",
    security([])
)]
#[post("/loans/apply")]
pub async fn apply(
    state: web::Data<HttpState>,
    payload: web::Json<ApplicationForm>,
) -> ApiResult<HttpResponse> {
    let submitted = state.loans.submit(payload.into_inner()).await?;
    Ok(Envelope::data(submitted)
        .with_message("Loan application submitted successfully")
        .respond(StatusCode::CREATED))
}

/// List applications visible to the caller.
#[utoipa::path(
    get,
    path = "/api/loans",
    params(ListLoansQuery),
    responses(
        (status = 200, description = "Page of loans, newest first", body = LoanPage),
        (status = 400, description = "Invalid filter or page", body = ErrorSchema),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema),
        (status = 403, description = "Role may not list loans", body = ErrorSchema)
    ),
    tags = ["loans"],
    operation_id = "listLoans"
)]
#[get("/loans")]
pub async fn list_loans(
    state: web::Data<HttpState>,
    identity: Authenticated,
    query: web::Query<ListLoansQuery>,
) -> ApiResult<HttpResponse> {
    let request = query.into_inner().into_request()?;
    let page = state.loan_queries.list(identity.user(), request).await?;
    Ok(envelope::ok(LoanPage::from(page)))
}

/// Fetch one application.
#[utoipa::path(
    get,
    path = "/api/loans/{id}",
    params(("id" = String, Path, description = "Loan identifier (UUID)")),
    responses(
        (status = 200, description = "Loan", body = LoanViewSchema),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema),
        (status = 403, description = "Loan not visible to this role", body = ErrorSchema),
        (status = 404, description = "Unknown loan", body = ErrorSchema)
    ),
    tags = ["loans"],
    operation_id = "getLoan"
)]
#[get("/loans/{id}")]
pub async fn get_loan(
    state: web::Data<HttpState>,
    identity: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_loan_id(&path)?;
    let loan = state.loan_queries.get(identity.user(), &id).await?;
    Ok(envelope::ok(loan))
}

/// Verify or reject a pending application.
#[utoipa::path(
    patch,
    path = "/api/loans/{id}/verify",
    params(("id" = String, Path, description = "Loan identifier (UUID)")),
    request_body = ReviewBody,
    responses(
        (status = 200, description = "Updated loan", body = LoanViewSchema),
        (status = 400, description = "Invalid action, missing reason or loan not pending", body = ErrorSchema),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema),
        (status = 403, description = "Role may not verify", body = ErrorSchema),
        (status = 404, description = "Unknown loan", body = ErrorSchema),
        (status = 409, description = "Loan changed concurrently", body = ErrorSchema)
    ),
    tags = ["loans"],
    operation_id = "verifyLoan"
)]
#[patch("/loans/{id}/verify")]
pub async fn verify_loan(
    state: web::Data<HttpState>,
    identity: Authenticated,
    path: web::Path<String>,
    payload: web::Json<ReviewBody>,
) -> ApiResult<HttpResponse> {
    let request = payload
        .into_inner()
        .into_request(&path, ReviewStage::Verification)?;
    let loan = state.loans.review(identity.user(), request).await?;
    Ok(envelope::ok_with_message(loan, "Loan review recorded"))
}
