//! Administrator endpoints: final loan decisions and staff accounts.
//!
//! ```text
//! PATCH  /api/admin/loans/{id}/approve {"action":"approve"}
//! GET    /api/admin/users?page=1&limit=10&role=verifier
//! POST   /api/admin/users
//! DELETE /api/admin/users/{id}
//! PATCH  /api/admin/users/{id}/activate
//! ```

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, delete, get, patch, post, web};
use pagination::{PageInfo, Paginated};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::loan::ReviewStage;
use crate::domain::ports::CreateUserRequest;
use crate::domain::User;
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope::{self, Envelope};
use crate::inbound::http::identity::Authenticated;
use crate::inbound::http::loans::ReviewBody;
use crate::inbound::http::schemas::{ErrorSchema, LoanViewSchema, PageInfoSchema, UserSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_page, parse_role, parse_user_id};

/// Query string for `GET /api/admin/users`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// `admin` or `verifier`.
    pub role: Option<String>,
}

/// New staff account.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct CreateUserBody {
    #[schema(example = "Grace Hopper")]
    pub name: Option<String>,
    #[schema(example = "grace@bank.test")]
    pub email: Option<String>,
    #[schema(min_length = 8)]
    pub password: Option<String>,
    #[schema(example = "verifier")]
    pub role: Option<String>,
}

impl From<CreateUserBody> for CreateUserRequest {
    fn from(body: CreateUserBody) -> Self {
        Self {
            name: body.name,
            email: body.email,
            password: body.password,
            role: body.role,
        }
    }
}

/// One page of staff accounts.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserPage {
    #[schema(value_type = Vec<UserSchema>)]
    pub users: Vec<User>,
    #[schema(value_type = PageInfoSchema)]
    pub pagination: PageInfo,
}

impl From<Paginated<User>> for UserPage {
    fn from(page: Paginated<User>) -> Self {
        Self {
            users: page.items,
            pagination: page.pagination,
        }
    }
}

/// Approve or reject a verified application.
#[utoipa::path(
    patch,
    path = "/api/admin/loans/{id}/approve",
    params(("id" = String, Path, description = "Loan identifier (UUID)")),
    request_body = ReviewBody,
    responses(
        (status = 200, description = "Updated loan", body = LoanViewSchema),
        (status = 400, description = "Invalid action, missing reason or loan not verified", body = ErrorSchema),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema),
        (status = 403, description = "Admin role required", body = ErrorSchema),
        (status = 404, description = "Unknown loan", body = ErrorSchema),
        (status = 409, description = "Loan changed concurrently", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "approveLoan"
)]
#[patch("/admin/loans/{id}/approve")]
pub async fn approve_loan(
    state: web::Data<HttpState>,
    identity: Authenticated,
    path: web::Path<String>,
    payload: web::Json<ReviewBody>,
) -> ApiResult<HttpResponse> {
    let request = payload
        .into_inner()
        .into_request(&path, ReviewStage::Approval)?;
    let loan = state.loans.review(identity.user(), request).await?;
    Ok(envelope::ok_with_message(loan, "Loan decision recorded"))
}

/// List staff accounts, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Page of users", body = UserPage),
        (status = 400, description = "Invalid role or page", body = ErrorSchema),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema),
        (status = 403, description = "Admin role required", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "listUsers"
)]
#[get("/admin/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    identity: Authenticated,
    query: web::Query<ListUsersQuery>,
) -> ApiResult<HttpResponse> {
    let ListUsersQuery { page, limit, role } = query.into_inner();
    let role = parse_role(role.as_deref())?;
    let page = parse_page(page, limit)?;
    let users = state.users.list(identity.user(), role, page).await?;
    Ok(envelope::ok(UserPage::from(users)))
}

/// Create a staff account.
#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = CreateUserBody,
    responses(
        (status = 201, description = "User created", body = UserSchema),
        (status = 400, description = "Invalid fields or email already taken", body = ErrorSchema),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema),
        (status = 403, description = "Admin role required", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "createUser"
)]
#[post("/admin/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    identity: Authenticated,
    payload: web::Json<CreateUserBody>,
) -> ApiResult<HttpResponse> {
    let user = state
        .users
        .create(identity.user(), payload.into_inner().into())
        .await?;
    Ok(Envelope::data(user)
        .with_message("User created successfully")
        .respond(StatusCode::CREATED))
}

/// Soft-deactivate a staff account.
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "User identifier (UUID)")),
    responses(
        (status = 200, description = "User deactivated", body = UserSchema),
        (status = 400, description = "Malformed id or own account", body = ErrorSchema),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema),
        (status = 403, description = "Admin role required", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "deactivateUser"
)]
#[delete("/admin/users/{id}")]
pub async fn deactivate_user(
    state: web::Data<HttpState>,
    identity: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(&path)?;
    let user = state.users.deactivate(identity.user(), &id).await?;
    Ok(envelope::ok_with_message(user, "User deactivated successfully"))
}

/// Reactivate a staff account.
#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/activate",
    params(("id" = String, Path, description = "User identifier (UUID)")),
    responses(
        (status = 200, description = "User activated", body = UserSchema),
        (status = 400, description = "Malformed id or own account", body = ErrorSchema),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema),
        (status = 403, description = "Admin role required", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "activateUser"
)]
#[patch("/admin/users/{id}/activate")]
pub async fn activate_user(
    state: web::Data<HttpState>,
    identity: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(&path)?;
    let user = state.users.activate(identity.user(), &id).await?;
    Ok(envelope::ok_with_message(user, "User activated successfully"))
}
