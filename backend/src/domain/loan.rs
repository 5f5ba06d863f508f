//! Loan application aggregate.
//!
//! A loan moves along a fixed lattice of statuses: `pending` to `verified` or
//! `rejected`, then from `verified` to `approved` or `rejected`. Approved and
//! rejected loans are terminal. [`lifecycle`] owns the transition rules;
//! [`application`] validates applicant submissions.

pub mod application;
pub mod lifecycle;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EmailAddress, PersonName, UserId, UserSummary};

pub use application::{ApplicationForm, DocumentForm, FormField, LoanApplication};
pub use lifecycle::{ReviewAction, ReviewDecision, ReviewStage, TransitionPlan, plan_transition};

/// Error raised when parsing loan identifiers or enum values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanValueError {
    /// Identifier was not a UUID.
    InvalidId,
    /// Status keyword is unknown.
    UnknownStatus,
    /// Employment status keyword is unknown.
    UnknownEmploymentStatus,
}

impl fmt::Display for LoanValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "loan id must be a valid UUID"),
            Self::UnknownStatus => {
                write!(f, "status must be one of: pending, verified, approved, rejected")
            }
            Self::UnknownEmploymentStatus => write!(
                f,
                "employment status must be one of: employed, self-employed, unemployed, retired"
            ),
        }
    }
}

impl std::error::Error for LoanValueError {}

/// Loan identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(Uuid);

impl LoanId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for LoanId {
    type Err = LoanValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| LoanValueError::InvalidId)
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a loan in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// Submitted and awaiting verification.
    Pending,
    /// Screened by a verifier, awaiting an admin decision.
    Verified,
    /// Approved by an admin. Terminal.
    Approved,
    /// Rejected at either stage. Terminal.
    Rejected,
}

impl LoanStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Verified, Self::Approved, Self::Rejected];

    /// Wire and storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Approved and rejected loans never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Statuses that block a second application from the same email.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Verified)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = LoanValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(LoanValueError::UnknownStatus),
        }
    }
}

/// Applicant's employment situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentStatus {
    /// Salaried employment.
    Employed,
    /// Self-employed or contractor.
    SelfEmployed,
    /// Not currently employed.
    Unemployed,
    /// Retired.
    Retired,
}

impl EmploymentStatus {
    /// Wire and storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Employed => "employed",
            Self::SelfEmployed => "self-employed",
            Self::Unemployed => "unemployed",
            Self::Retired => "retired",
        }
    }
}

impl fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmploymentStatus {
    type Err = LoanValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employed" => Ok(Self::Employed),
            "self-employed" => Ok(Self::SelfEmployed),
            "unemployed" => Ok(Self::Unemployed),
            "retired" => Ok(Self::Retired),
            _ => Err(LoanValueError::UnknownEmploymentStatus),
        }
    }
}

/// Supporting document reference supplied by the applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanDocument {
    /// Display name.
    pub name: String,
    /// Location of the document.
    pub url: String,
}

/// Stored loan application.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    /// Identifier.
    pub id: LoanId,
    /// Applicant's full name.
    pub applicant_name: PersonName,
    /// Applicant's normalised email.
    pub email: EmailAddress,
    /// Applicant's phone number.
    pub phone: String,
    /// Requested amount.
    pub amount: f64,
    /// Stated purpose.
    pub purpose: String,
    /// Employment situation.
    pub employment_status: EmploymentStatus,
    /// Monthly income.
    pub monthly_income: f64,
    /// Optional credit score.
    pub credit_score: Option<u16>,
    /// Lifecycle status.
    pub status: LoanStatus,
    /// User who took the verification decision.
    #[serde(skip_serializing)]
    pub verified_by: Option<UserId>,
    /// When the verification decision was taken.
    pub verified_at: Option<DateTime<Utc>>,
    /// User who took the approval decision.
    #[serde(skip_serializing)]
    pub approved_by: Option<UserId>,
    /// When the approval decision was taken.
    pub approved_at: Option<DateTime<Utc>>,
    /// Reason recorded on rejection.
    pub rejection_reason: Option<String>,
    /// Supporting documents.
    pub documents: Vec<LoanDocument>,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// Create a fresh `pending` loan from a validated application.
    pub fn submit(application: LoanApplication, now: DateTime<Utc>) -> Self {
        let LoanApplication {
            applicant_name,
            email,
            phone,
            amount,
            purpose,
            employment_status,
            monthly_income,
            credit_score,
            documents,
        } = application;
        Self {
            id: LoanId::random(),
            applicant_name,
            email,
            phone,
            amount,
            purpose,
            employment_status,
            monthly_income,
            credit_score,
            status: LoanStatus::Pending,
            verified_by: None,
            verified_at: None,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            documents,
            created_at: now,
            updated_at: now,
        }
    }

    /// Users referenced by the loan's decision fields.
    pub fn actor_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.verified_by.into_iter().chain(self.approved_by)
    }
}

/// Reference to a deciding user, expanded when the user still exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActorReference {
    /// Resolved name and email.
    Summary(UserSummary),
    /// The user record could not be found.
    Unresolved {
        /// Identifier recorded on the loan.
        id: UserId,
    },
}

/// Loan with actor references expanded for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanView {
    /// The loan record.
    #[serde(flatten)]
    pub loan: Loan,
    /// Expanded verifier reference.
    pub verified_by: Option<ActorReference>,
    /// Expanded approver reference.
    pub approved_by: Option<ActorReference>,
}

impl LoanView {
    /// Expand `loan`'s actor references using `summaries`.
    pub fn expand(loan: Loan, summaries: &[UserSummary]) -> Self {
        let resolve = |id: Option<UserId>| {
            id.map(|id| {
                summaries
                    .iter()
                    .find(|summary| summary.id == id)
                    .cloned()
                    .map_or(ActorReference::Unresolved { id }, ActorReference::Summary)
            })
        };
        let verified_by = resolve(loan.verified_by);
        let approved_by = resolve(loan.approved_by);
        Self {
            loan,
            verified_by,
            approved_by,
        }
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedLoan {
    /// New loan identifier.
    pub loan_id: LoanId,
    /// Always `pending`.
    pub status: LoanStatus,
}
