//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, web};
use chrono::TimeDelta;
use mockable::Clock;

use crate::Trace;
use crate::domain::ports::{FixturePasswordHasher, LoanRepository, TokenCodec, UserRepository};
use crate::domain::{
    EmailAddress, Loan, LoanStatus, PersonName, Role, User, UserAccount, UserId,
};
use crate::inbound::http::health::HealthState;
use crate::inbound::http::state::{HttpState, StateDependencies};
use crate::outbound::memory::{InMemoryLoanRepository, InMemoryUserRepository};
use crate::outbound::security::JwtTokenCodec;
use crate::test_support::{MutableClock, fixed_now, sample_loan};

const SECRET: [u8; 32] = [42; 32];

/// `Authorization` header for `token`.
pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

/// In-memory stores plus a token codec sharing one fixed clock.
pub struct TestHarness {
    pub loans: Arc<InMemoryLoanRepository>,
    pub users: Arc<InMemoryUserRepository>,
    pub clock: Arc<MutableClock>,
    tokens: Arc<JwtTokenCodec>,
}

impl TestHarness {
    pub fn new() -> Self {
        let tokens = JwtTokenCodec::new(&SECRET, TimeDelta::hours(168)).expect("codec");
        Self {
            loans: Arc::new(InMemoryLoanRepository::default()),
            users: Arc::new(InMemoryUserRepository::default()),
            clock: Arc::new(MutableClock::new(fixed_now())),
            tokens: Arc::new(tokens),
        }
    }

    pub fn state(&self) -> HttpState {
        HttpState::from_stores(StateDependencies {
            loans: Arc::clone(&self.loans),
            users: Arc::clone(&self.users),
            hasher: Arc::new(FixturePasswordHasher),
            tokens: self.tokens.clone(),
            clock: self.clock.clone(),
        })
    }

    /// Full `/api` application with tracing, over this harness's stores.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody + use<>>,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        let health = web::Data::new(HealthState::new());
        health.mark_ready();
        App::new()
            .app_data(web::Data::new(self.state()))
            .app_data(health)
            .wrap(Trace)
            .configure(super::configure)
    }

    /// Store an active account with a fixture hash of `password`.
    pub async fn seed_user(&self, name: &str, email: &str, password: &str, role: Role) -> User {
        let now = self.clock.utc();
        let user = User {
            id: UserId::random(),
            name: PersonName::new(name).expect("valid name"),
            email: EmailAddress::new(email).expect("valid email"),
            role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        let account = UserAccount {
            user: user.clone(),
            password_hash: FixturePasswordHasher::encode(password),
        };
        self.users.create(&account).await.expect("seed user");
        user
    }

    /// Seed a user with `role` and return it with a valid token.
    pub async fn signed_in(&self, role: Role) -> (User, String) {
        let email = format!("{role}-{}@bank.test", UserId::random());
        let user = self
            .seed_user(&format!("Test {role}"), &email, "s3cretpass", role)
            .await;
        let token = self.token_for(&user);
        (user, token)
    }

    pub fn token_for(&self, user: &User) -> String {
        self.tokens
            .issue(user, self.clock.utc())
            .expect("issue token")
            .token
    }

    /// Store a loan already in `status`.
    pub async fn seed_loan(&self, status: LoanStatus, email: &str) -> Loan {
        let mut loan = sample_loan(status);
        loan.email = EmailAddress::new(email).expect("valid email");
        self.loans.insert(&loan).await.expect("seed loan");
        loan
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
