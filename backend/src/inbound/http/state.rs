//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on driving ports and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    DashboardQuery, IdentityResolver, LoanCommand, LoanQuery, LoanRepository, LoginService,
    PasswordHasher, TokenCodec, UserAdministration, UserRepository,
};
use crate::domain::{AuthService, DashboardService, LoanService, UserAdminService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub identity: Arc<dyn IdentityResolver>,
    pub loans: Arc<dyn LoanCommand>,
    pub loan_queries: Arc<dyn LoanQuery>,
    pub users: Arc<dyn UserAdministration>,
    pub dashboard: Arc<dyn DashboardQuery>,
}

/// Driven adapters the domain services are built on.
pub struct StateDependencies<L, U> {
    pub loans: Arc<L>,
    pub users: Arc<U>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenCodec>,
    pub clock: Arc<dyn Clock>,
}

impl HttpState {
    /// Build every domain service over one loan store and one user store.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use loan_backend::domain::ports::FixturePasswordHasher;
    /// use loan_backend::inbound::http::state::{HttpState, StateDependencies};
    /// use loan_backend::outbound::memory::{InMemoryLoanRepository, InMemoryUserRepository};
    /// use loan_backend::outbound::security::JwtTokenCodec;
    /// use mockable::DefaultClock;
    ///
    /// let tokens = JwtTokenCodec::new(&[7_u8; 32], chrono::TimeDelta::hours(1))
    ///     .expect("secret is long enough");
    /// let state = HttpState::from_stores(StateDependencies {
    ///     loans: Arc::new(InMemoryLoanRepository::default()),
    ///     users: Arc::new(InMemoryUserRepository::default()),
    ///     hasher: Arc::new(FixturePasswordHasher),
    ///     tokens: Arc::new(tokens),
    ///     clock: Arc::new(DefaultClock),
    /// });
    /// let _login = state.login.clone();
    /// ```
    pub fn from_stores<L, U>(deps: StateDependencies<L, U>) -> Self
    where
        L: LoanRepository + 'static,
        U: UserRepository + 'static,
    {
        let StateDependencies {
            loans,
            users,
            hasher,
            tokens,
            clock,
        } = deps;

        let auth = Arc::new(AuthService::new(
            Arc::clone(&users),
            Arc::clone(&hasher),
            tokens,
            Arc::clone(&clock),
        ));
        let lifecycle = Arc::new(LoanService::new(
            Arc::clone(&loans),
            Arc::clone(&users),
            Arc::clone(&clock),
        ));
        let admin = Arc::new(UserAdminService::new(
            Arc::clone(&users),
            hasher,
            Arc::clone(&clock),
        ));
        let dashboard = Arc::new(DashboardService::new(loans, users, clock));

        Self {
            login: auth.clone(),
            identity: auth,
            loans: lifecycle.clone(),
            loan_queries: lifecycle,
            users: admin,
            dashboard,
        }
    }
}
