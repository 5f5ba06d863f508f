//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api` endpoint, the wrapper schemas from
//! [`crate::inbound::http::schemas`] and the bearer token security scheme.
//! Swagger UI serves it in debug builds and `openapi-dump` prints it.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::admin::{CreateUserBody, UserPage};
use crate::inbound::http::auth::LoginRequest;
use crate::inbound::http::loans::{LoanPage, ReviewBody};
use crate::inbound::http::schemas::{
    ActorReferenceSchema, ApplicationFormSchema, DashboardStatsSchema, DocumentFormSchema,
    EmploymentStatusSchema, ErrorCodeSchema, ErrorSchema, FieldViolationSchema,
    LoanDocumentSchema, LoanStatusSchema, LoanViewSchema, LoginOutcomeSchema,
    MonthlyTrendSchema, MyActivitySchema, PageInfoSchema, RoleSchema, StatusBreakdownSchema,
    StatusShareSchema, SubmittedLoanSchema, UserCountsSchema, UserSchema,
};

/// Name of the bearer security scheme.
pub const BEARER_SCHEME: &str = "BearerAuth";

/// Adds the JWT bearer scheme to the generated components.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Token issued by POST /api/auth/login."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Loan application backend API",
        description = "Loan intake, two-stage review, dashboards and staff administration."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::health::live,
        crate::inbound::http::health::ready,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::me,
        crate::inbound::http::loans::apply,
        crate::inbound::http::loans::list_loans,
        crate::inbound::http::loans::get_loan,
        crate::inbound::http::loans::verify_loan,
        crate::inbound::http::admin::approve_loan,
        crate::inbound::http::admin::list_users,
        crate::inbound::http::admin::create_user,
        crate::inbound::http::admin::deactivate_user,
        crate::inbound::http::admin::activate_user,
        crate::inbound::http::dashboard::stats,
        crate::inbound::http::dashboard::recent_loans,
        crate::inbound::http::dashboard::my_activity,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        FieldViolationSchema,
        RoleSchema,
        UserSchema,
        ActorReferenceSchema,
        LoanStatusSchema,
        EmploymentStatusSchema,
        LoanDocumentSchema,
        LoanViewSchema,
        DocumentFormSchema,
        ApplicationFormSchema,
        SubmittedLoanSchema,
        PageInfoSchema,
        StatusShareSchema,
        StatusBreakdownSchema,
        MonthlyTrendSchema,
        UserCountsSchema,
        DashboardStatsSchema,
        MyActivitySchema,
        LoginOutcomeSchema,
        LoginRequest,
        ReviewBody,
        CreateUserBody,
        LoanPage,
        UserPage,
    )),
    tags(
        (name = "auth", description = "Login and identity"),
        (name = "loans", description = "Loan submission, listing and verification"),
        (name = "admin", description = "Approval decisions and staff accounts"),
        (name = "dashboard", description = "Role-scoped statistics"),
        (name = "health", description = "Liveness and readiness checks")
    )
)]
pub struct ApiDoc;
