//! Authentication endpoints.
//!
//! ```text
//! POST /api/auth/login {"email":"ada@bank.test","password":"s3cretpass"}
//! GET  /api/auth/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, FieldViolation, LoginCredentials, LoginValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope;
use crate::inbound::http::identity::Authenticated;
use crate::inbound::http::schemas::{ErrorSchema, LoginOutcomeSchema, UserSchema};
use crate::inbound::http::state::HttpState;

/// Login request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@bank.test")]
    pub email: Option<String>,
    #[schema(example = "s3cretpass")]
    pub password: Option<String>,
}

fn map_login_validation_error(err: &LoginValidationError) -> Error {
    let field = match err {
        LoginValidationError::EmptyEmail => "email",
        LoginValidationError::EmptyPassword => "password",
    };
    Error::validation(vec![FieldViolation::new(field, "required", err.to_string())])
}

fn parse_login(payload: LoginRequest) -> Result<LoginCredentials, Error> {
    LoginCredentials::try_from_parts(
        payload.email.as_deref().unwrap_or_default(),
        payload.password.as_deref().unwrap_or_default(),
    )
    .map_err(|err| map_login_validation_error(&err))
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginOutcomeSchema),
        (status = 400, description = "Missing email or password", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 503, description = "User store unavailable", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials = parse_login(payload.into_inner())?;
    let outcome = state.login.login(&credentials).await?;
    Ok(envelope::ok_with_message(outcome, "Login successful"))
}

/// Return the authenticated caller.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserSchema),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "currentUser"
)]
#[get("/auth/me")]
pub async fn me(identity: Authenticated) -> ApiResult<HttpResponse> {
    Ok(envelope::ok(identity.0))
}
