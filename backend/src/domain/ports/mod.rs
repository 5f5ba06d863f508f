//! Domain ports for the hexagonal boundary.
//!
//! Driven ports (repositories, hashing, token signing) are implemented by
//! outbound adapters. Driving ports are implemented by domain services and
//! called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod dashboard_query;
mod identity_resolver;
mod loan_command;
mod loan_query;
mod loan_repository;
mod login_service;
mod password_hasher;
mod token_codec;
mod user_administration;
mod user_repository;

pub use dashboard_query::DashboardQuery;
pub use identity_resolver::IdentityResolver;
pub use loan_command::{LoanCommand, ReviewRequest};
pub use loan_query::{ListLoansRequest, LoanQuery};
#[cfg(test)]
pub use loan_repository::MockLoanRepository;
pub use loan_repository::{
    LoanListFilter, LoanRepository, LoanRepositoryError, LoanTotals, MonthlyActivity,
    StatusCounts, TransitionOutcome,
};
pub use login_service::LoginService;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{FixturePasswordHasher, PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use token_codec::MockTokenCodec;
pub use token_codec::{TokenCodec, TokenCodecError};
pub use user_administration::{CreateUserRequest, UserAdministration};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserCounts, UserRepository, UserRepositoryError};
