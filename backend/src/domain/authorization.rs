//! Role policy table for protected operations.
//!
//! Every protected operation is listed once with its permitted roles.
//! Handlers resolve the caller's identity first, then pass it to
//! [`authorize`] together with the operation they are about to perform.

use super::{Error, Role, User};

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const VERIFIER_OR_ADMIN: &[Role] = &[Role::Verifier, Role::Admin];

/// Operations gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// List loan applications.
    ListLoans,
    /// Read a single loan application.
    ViewLoan,
    /// Verify or reject a pending application.
    VerifyLoan,
    /// Approve or reject a verified application.
    ApproveLoan,
    /// List, create, deactivate and reactivate staff users.
    ManageUsers,
    /// Read dashboard statistics and activity.
    ViewDashboard,
}

impl Operation {
    /// Roles allowed to perform the operation.
    pub fn permitted_roles(self) -> &'static [Role] {
        match self {
            Self::ListLoans | Self::ViewLoan | Self::VerifyLoan | Self::ViewDashboard => {
                VERIFIER_OR_ADMIN
            }
            Self::ApproveLoan | Self::ManageUsers => ADMIN_ONLY,
        }
    }

    /// Whether `role` may perform the operation.
    pub fn permits(self, role: Role) -> bool {
        self.permitted_roles().contains(&role)
    }
}

/// Check that `identity` may perform `operation`.
///
/// # Errors
/// [`Error::unauthorized`] when no identity was resolved,
/// [`Error::forbidden`] when the identity's role is not permitted.
///
/// # Examples
/// ```
/// use loan_backend::domain::{ErrorCode, Operation, authorize};
///
/// let err = authorize(None, Operation::ListLoans).unwrap_err();
/// assert_eq!(err.code(), ErrorCode::Unauthorized);
/// ```
pub fn authorize(identity: Option<&User>, operation: Operation) -> Result<&User, Error> {
    let user = identity.ok_or_else(|| Error::unauthorized("Authentication required"))?;
    if operation.permits(user.role) {
        Ok(user)
    } else {
        Err(Error::forbidden(format!(
            "Role {} is not permitted to perform this action",
            user.role
        )))
    }
}
