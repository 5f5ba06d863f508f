//! Dashboard endpoints. Any authenticated role may call them; the content
//! is scoped to the caller's role by the dashboard service.

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope;
use crate::inbound::http::identity::Authenticated;
use crate::inbound::http::schemas::{
    DashboardStatsSchema, ErrorSchema, LoanViewSchema, MyActivitySchema,
};
use crate::inbound::http::state::HttpState;

/// Query string for the recent-loans feed.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentLoansQuery {
    /// Feed length; defaults to 5 and is clamped to 1..=20.
    pub limit: Option<u32>,
}

/// Status breakdown, amounts and monthly trends.
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStatsSchema),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["dashboard"],
    operation_id = "dashboardStats"
)]
#[get("/dashboard/stats")]
pub async fn stats(
    state: web::Data<HttpState>,
    identity: Authenticated,
) -> ApiResult<HttpResponse> {
    let stats = state.dashboard.stats(identity.user()).await?;
    Ok(envelope::ok(stats))
}

/// Newest applications visible to the caller.
#[utoipa::path(
    get,
    path = "/api/dashboard/recent-loans",
    params(RecentLoansQuery),
    responses(
        (status = 200, description = "Recent loans", body = [LoanViewSchema]),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema)
    ),
    tags = ["dashboard"],
    operation_id = "recentLoans"
)]
#[get("/dashboard/recent-loans")]
pub async fn recent_loans(
    state: web::Data<HttpState>,
    identity: Authenticated,
    query: web::Query<RecentLoansQuery>,
) -> ApiResult<HttpResponse> {
    let loans = state
        .dashboard
        .recent_loans(identity.user(), query.limit)
        .await?;
    Ok(envelope::ok(loans))
}

/// Decisions taken by the caller and the size of their queue.
#[utoipa::path(
    get,
    path = "/api/dashboard/my-activity",
    responses(
        (status = 200, description = "Caller activity", body = MyActivitySchema),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema)
    ),
    tags = ["dashboard"],
    operation_id = "myActivity"
)]
#[get("/dashboard/my-activity")]
pub async fn my_activity(
    state: web::Data<HttpState>,
    identity: Authenticated,
) -> ApiResult<HttpResponse> {
    let activity = state.dashboard.my_activity(identity.user()).await?;
    Ok(envelope::ok(activity))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::{Value, json};

    use crate::domain::{LoanStatus, Role};
    use crate::inbound::http::test_utils::{TestHarness, bearer};

    async fn get_json(harness: &TestHarness, token: &str, uri: &str) -> (StatusCode, Value) {
        let app = test::init_service(harness.app()).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(uri)
                .insert_header(bearer(token))
                .to_request(),
        )
        .await;
        let status = res.status();
        (status, test::read_body_json(res).await)
    }

    #[actix_web::test]
    async fn empty_store_reports_zero_percentages() {
        let harness = TestHarness::new();
        let (_, token) = harness.signed_in(Role::Admin).await;

        let (status, body) = get_json(&harness, &token, "/api/dashboard/stats").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totalLoans"], json!(0));
        for key in ["pending", "verified", "approved", "rejected"] {
            assert_eq!(body["data"]["byStatus"][key]["percentage"], json!(0.0));
        }
        assert_eq!(body["data"]["monthlyTrends"].as_array().map(Vec::len), Some(6));
    }

    #[rstest]
    #[case(Role::Admin, true)]
    #[case(Role::Verifier, false)]
    #[actix_web::test]
    async fn user_counts_are_admin_only(#[case] role: Role, #[case] present: bool) {
        let harness = TestHarness::new();
        let (_, token) = harness.signed_in(role).await;

        let (_, body) = get_json(&harness, &token, "/api/dashboard/stats").await;

        assert_eq!(body["data"].get("users").is_some(), present);
    }

    #[actix_web::test]
    async fn verifier_recent_feed_hides_decided_loans() {
        let harness = TestHarness::new();
        harness.seed_loan(LoanStatus::Pending, "a@x.com").await;
        harness.seed_loan(LoanStatus::Rejected, "b@x.com").await;
        let (_, token) = harness.signed_in(Role::Verifier).await;

        let (status, body) = get_json(&harness, &token, "/api/dashboard/recent-loans?limit=50").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    }

    #[actix_web::test]
    async fn my_activity_is_role_shaped() {
        let harness = TestHarness::new();
        harness.seed_loan(LoanStatus::Pending, "a@x.com").await;
        let (_, token) = harness.signed_in(Role::Verifier).await;

        let (_, body) = get_json(&harness, &token, "/api/dashboard/my-activity").await;

        assert_eq!(body["data"]["role"], json!("verifier"));
        assert_eq!(body["data"]["pendingCount"], json!(1));
        assert_eq!(body["data"]["verifiedToday"], json!(0));
    }

    #[actix_web::test]
    async fn anonymous_callers_are_rejected() {
        let harness = TestHarness::new();
        let app = test::init_service(harness.app()).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/dashboard/stats").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
