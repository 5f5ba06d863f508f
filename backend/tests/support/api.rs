//! In-process API client over in-memory stores.
//!
//! Each call builds a fresh actix test service around the same shared
//! [`HttpState`], so data persists across requests within one test.

use std::sync::Arc;

use actix_web::http::Method;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test, web};
use chrono::TimeDelta;
use mockable::DefaultClock;
use serde_json::{Value, json};

use loan_backend::Trace;
use loan_backend::domain::TRACE_ID_HEADER;
use loan_backend::domain::UserAdminService;
use loan_backend::domain::ports::FixturePasswordHasher;
use loan_backend::inbound::http::configure;
use loan_backend::inbound::http::health::HealthState;
use loan_backend::inbound::http::state::{HttpState, StateDependencies};
use loan_backend::outbound::memory::{InMemoryLoanRepository, InMemoryUserRepository};
use loan_backend::outbound::security::JwtTokenCodec;

pub const ADMIN_EMAIL: &str = "root@bank.test";
pub const PASSWORD: &str = "s3cretpass";

/// A recorded response.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub trace_id: Option<String>,
    pub body: Value,
}

/// Shared state plus the user store used for bootstrapping.
pub struct TestApi {
    pub state: HttpState,
    users: Arc<InMemoryUserRepository>,
}

impl TestApi {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::default());
        let tokens =
            JwtTokenCodec::new(&[9_u8; 32], TimeDelta::hours(1)).expect("signing secret");
        let state = HttpState::from_stores(StateDependencies {
            loans: Arc::new(InMemoryLoanRepository::default()),
            users: Arc::clone(&users),
            hasher: Arc::new(FixturePasswordHasher),
            tokens: Arc::new(tokens),
            clock: Arc::new(DefaultClock),
        });
        Self { state, users }
    }

    /// Create the first admin directly against the store.
    pub async fn bootstrap_admin(&self) {
        UserAdminService::new(
            Arc::clone(&self.users),
            Arc::new(FixturePasswordHasher),
            Arc::new(DefaultClock),
        )
        .bootstrap_admin("Root Admin", ADMIN_EMAIL, PASSWORD)
        .await
        .expect("bootstrap admin");
    }

    pub async fn call(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let health = web::Data::new(HealthState::new());
        health.mark_ready();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(self.state.clone()))
                .app_data(health)
                .wrap(Trace)
                .configure(configure),
        )
        .await;

        let mut request = test::TestRequest::default().method(method).uri(path);
        if let Some(token) = token {
            request = request.insert_header((AUTHORIZATION, format!("Bearer {token}")));
        }
        if let Some(body) = body {
            request = request.set_json(body);
        }
        let res = test::call_service(&app, request.to_request()).await;
        let status = res.status().as_u16();
        let trace_id = res
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = test::read_body(res).await;
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply {
            status,
            trace_id,
            body,
        }
    }

    /// Log in and return the bearer token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let reply = self
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(reply.status, 200, "login failed: {}", reply.body);
        reply.body["data"]["token"]
            .as_str()
            .expect("token")
            .to_owned()
    }

    /// Create a staff account through the admin API and log in as it.
    pub async fn staff_token(&self, admin_token: &str, email: &str, role: &str) -> String {
        let reply = self
            .call(
                Method::POST,
                "/api/admin/users",
                Some(admin_token),
                Some(json!({
                    "name": "Staff Member",
                    "email": email,
                    "password": PASSWORD,
                    "role": role
                })),
            )
            .await;
        assert_eq!(reply.status, 201, "create user failed: {}", reply.body);
        self.login(email, PASSWORD).await
    }

    /// Submit an application for `email` and return the loan id.
    pub async fn submit(&self, email: &str) -> Reply {
        self.call(
            Method::POST,
            "/api/loans/apply",
            None,
            Some(application(email)),
        )
        .await
    }
}

/// A complete, valid application body.
pub fn application(email: &str) -> Value {
    json!({
        "applicantName": "Jane Doe",
        "email": email,
        "phone": "555-0100",
        "amount": 5000,
        "purpose": "Home improvement",
        "employmentStatus": "employed",
        "monthlyIncome": 4200,
        "creditScore": 720
    })
}
