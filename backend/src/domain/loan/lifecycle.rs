//! Loan status transitions.
//!
//! | From     | Action  | Stage        | To       |
//! |----------|---------|--------------|----------|
//! | pending  | verify  | verification | verified |
//! | pending  | reject  | verification | rejected |
//! | verified | approve | approval     | approved |
//! | verified | reject  | approval     | rejected |
//!
//! Planning is pure: [`plan_transition`] checks the current status and
//! returns a [`TransitionPlan`] that repositories apply with a conditional
//! update guarded by [`TransitionPlan::expected`].

use std::fmt;

use chrono::{DateTime, Utc};

use super::{Loan, LoanStatus};
use crate::domain::{Error, FieldViolation, Operation, UserId};

/// Review stage a decision belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewStage {
    /// First screening of a pending application.
    Verification,
    /// Final decision on a verified application.
    Approval,
}

impl ReviewStage {
    /// Status a loan must hold before the stage can act on it.
    pub fn source(self) -> LoanStatus {
        match self {
            Self::Verification => LoanStatus::Pending,
            Self::Approval => LoanStatus::Verified,
        }
    }

    /// The affirmative verb for the stage.
    pub fn advance_action(self) -> ReviewAction {
        match self {
            Self::Verification => ReviewAction::Verify,
            Self::Approval => ReviewAction::Approve,
        }
    }

    /// Status reached when the stage advances the loan.
    pub fn advanced(self) -> LoanStatus {
        match self {
            Self::Verification => LoanStatus::Verified,
            Self::Approval => LoanStatus::Approved,
        }
    }

    /// Protected operation guarding the stage.
    pub fn operation(self) -> Operation {
        match self {
            Self::Verification => Operation::VerifyLoan,
            Self::Approval => Operation::ApproveLoan,
        }
    }
}

impl fmt::Display for ReviewStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verification => f.write_str("verification"),
            Self::Approval => f.write_str("approval"),
        }
    }
}

/// Decision verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewAction {
    /// Move a pending loan to verified.
    Verify,
    /// Move a verified loan to approved.
    Approve,
    /// Reject at the current stage.
    Reject,
}

impl ReviewAction {
    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verify => "verify",
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

/// Validated decision for one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDecision {
    stage: ReviewStage,
    action: ReviewAction,
    rejection_reason: Option<String>,
}

impl ReviewDecision {
    /// Parse an action keyword and optional reason for `stage`.
    ///
    /// # Errors
    /// A validation error when the keyword is not one of the stage's two
    /// verbs, or when a rejection carries no reason.
    ///
    /// # Examples
    /// ```
    /// use loan_backend::domain::loan::{ReviewAction, ReviewDecision, ReviewStage};
    ///
    /// let decision = ReviewDecision::parse(ReviewStage::Verification, "verify", None).unwrap();
    /// assert_eq!(decision.action(), ReviewAction::Verify);
    /// assert!(ReviewDecision::parse(ReviewStage::Verification, "approve", None).is_err());
    /// assert!(ReviewDecision::parse(ReviewStage::Approval, "reject", Some("  ")).is_err());
    /// ```
    pub fn parse(stage: ReviewStage, action: &str, reason: Option<&str>) -> Result<Self, Error> {
        let advance = stage.advance_action();
        let parsed = match action.trim() {
            value if value == advance.as_str() => advance,
            "reject" => ReviewAction::Reject,
            _ => {
                return Err(Error::validation(vec![FieldViolation::new(
                    "action",
                    "invalid_value",
                    format!("action must be either '{}' or 'reject'", advance.as_str()),
                )]));
            }
        };

        let rejection_reason = match parsed {
            ReviewAction::Reject => {
                let reason = reason.map(str::trim).unwrap_or_default();
                if reason.is_empty() {
                    return Err(Error::validation(vec![FieldViolation::new(
                        "rejectionReason",
                        "required",
                        "rejectionReason is required when rejecting",
                    )]));
                }
                Some(reason.to_owned())
            }
            ReviewAction::Verify | ReviewAction::Approve => None,
        };

        Ok(Self {
            stage,
            action: parsed,
            rejection_reason,
        })
    }

    /// Stage the decision applies to.
    pub fn stage(&self) -> ReviewStage {
        self.stage
    }

    /// Parsed verb.
    pub fn action(&self) -> ReviewAction {
        self.action
    }

    /// Trimmed rejection reason, present only for rejections.
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// Status the loan will hold after the decision.
    pub fn target(&self) -> LoanStatus {
        match self.action {
            ReviewAction::Reject => LoanStatus::Rejected,
            ReviewAction::Verify | ReviewAction::Approve => self.stage.advanced(),
        }
    }
}

/// Planned mutation for a single loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    /// Status the loan must still hold when the update is applied.
    pub expected: LoanStatus,
    /// Status written by the update.
    pub next: LoanStatus,
    /// Stage whose actor fields are recorded.
    pub stage: ReviewStage,
    /// Deciding user.
    pub actor: UserId,
    /// Decision time.
    pub at: DateTime<Utc>,
    /// Reason written on rejection.
    pub rejection_reason: Option<String>,
}

impl TransitionPlan {
    /// Apply the plan to an in-memory loan.
    ///
    /// Callers must have checked `loan.status == self.expected`.
    pub fn apply(&self, loan: &mut Loan) {
        loan.status = self.next;
        match self.stage {
            ReviewStage::Verification => {
                loan.verified_by = Some(self.actor);
                loan.verified_at = Some(self.at);
            }
            ReviewStage::Approval => {
                loan.approved_by = Some(self.actor);
                loan.approved_at = Some(self.at);
            }
        }
        if let Some(reason) = &self.rejection_reason {
            loan.rejection_reason = Some(reason.clone());
        }
        loan.updated_at = self.at;
    }
}

/// Plan the transition of a loan currently in `current` status.
///
/// # Errors
/// [`Error::invalid_transition`] when `current` is not the stage's source
/// status.
pub fn plan_transition(
    current: LoanStatus,
    decision: &ReviewDecision,
    actor: UserId,
    at: DateTime<Utc>,
) -> Result<TransitionPlan, Error> {
    let stage = decision.stage();
    let expected = stage.source();
    if current != expected {
        return Err(Error::invalid_transition(format!(
            "Cannot {} a loan with status '{current}'; it must be '{expected}'",
            decision.action().as_str()
        )));
    }
    Ok(TransitionPlan {
        expected,
        next: decision.target(),
        stage,
        actor,
        at,
        rejection_reason: decision.rejection_reason.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::test_support::sample_loan;
    use rstest::rstest;

    fn decision(stage: ReviewStage, action: &str, reason: Option<&str>) -> ReviewDecision {
        ReviewDecision::parse(stage, action, reason).expect("valid decision")
    }

    #[rstest]
    #[case(ReviewStage::Verification, "verify", None, LoanStatus::Verified)]
    #[case(ReviewStage::Verification, "reject", Some("bad docs"), LoanStatus::Rejected)]
    #[case(ReviewStage::Approval, "approve", None, LoanStatus::Approved)]
    #[case(ReviewStage::Approval, "reject", Some("risk"), LoanStatus::Rejected)]
    fn legal_transitions(
        #[case] stage: ReviewStage,
        #[case] action: &str,
        #[case] reason: Option<&str>,
        #[case] target: LoanStatus,
    ) {
        let actor = UserId::random();
        let at = Utc::now();
        let plan = plan_transition(stage.source(), &decision(stage, action, reason), actor, at)
            .expect("legal transition");
        assert_eq!(plan.expected, stage.source());
        assert_eq!(plan.next, target);
        assert_eq!(plan.actor, actor);
    }

    #[rstest]
    #[case(ReviewStage::Verification, LoanStatus::Verified)]
    #[case(ReviewStage::Verification, LoanStatus::Approved)]
    #[case(ReviewStage::Verification, LoanStatus::Rejected)]
    #[case(ReviewStage::Approval, LoanStatus::Pending)]
    #[case(ReviewStage::Approval, LoanStatus::Approved)]
    #[case(ReviewStage::Approval, LoanStatus::Rejected)]
    fn wrong_source_status_is_invalid_transition(
        #[case] stage: ReviewStage,
        #[case] current: LoanStatus,
    ) {
        let advance = decision(stage, stage.advance_action().as_str(), None);
        let reject = decision(stage, "reject", Some("no"));
        for decision in [advance, reject] {
            let err = plan_transition(current, &decision, UserId::random(), Utc::now())
                .expect_err("illegal transition");
            assert_eq!(err.code(), ErrorCode::InvalidTransition);
        }
    }

    #[rstest]
    #[case(ReviewStage::Verification, None)]
    #[case(ReviewStage::Verification, Some(""))]
    #[case(ReviewStage::Approval, Some("   "))]
    fn reject_without_reason_is_validation_error(
        #[case] stage: ReviewStage,
        #[case] reason: Option<&str>,
    ) {
        let err = ReviewDecision::parse(stage, "reject", reason).expect_err("reason required");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            err.errors().first().map(|v| v.field.as_str()),
            Some("rejectionReason")
        );
    }

    #[rstest]
    #[case(ReviewStage::Verification, "approve")]
    #[case(ReviewStage::Approval, "verify")]
    #[case(ReviewStage::Approval, "APPROVE")]
    #[case(ReviewStage::Verification, "")]
    fn unknown_verbs_are_validation_errors(#[case] stage: ReviewStage, #[case] action: &str) {
        let err = ReviewDecision::parse(stage, action, Some("x")).expect_err("bad verb");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    fn reason_is_ignored_for_advancing_actions() {
        let decision = decision(ReviewStage::Approval, "approve", Some("looks good"));
        assert_eq!(decision.rejection_reason(), None);
    }

    #[rstest]
    fn apply_records_stage_actor_and_reason() {
        let mut loan = sample_loan(LoanStatus::Verified);
        let actor = UserId::random();
        let at = Utc::now();
        let plan = plan_transition(
            loan.status,
            &decision(ReviewStage::Approval, "reject", Some(" income unverifiable ")),
            actor,
            at,
        )
        .expect("legal");
        plan.apply(&mut loan);
        assert_eq!(loan.status, LoanStatus::Rejected);
        assert_eq!(loan.approved_by, Some(actor));
        assert_eq!(loan.approved_at, Some(at));
        assert_eq!(loan.verified_by, None);
        assert_eq!(loan.rejection_reason.as_deref(), Some("income unverifiable"));
        assert_eq!(loan.updated_at, at);
    }

    #[rstest]
    #[case(ReviewStage::Verification, Operation::VerifyLoan)]
    #[case(ReviewStage::Approval, Operation::ApproveLoan)]
    fn stages_are_gated_by_their_operation(
        #[case] stage: ReviewStage,
        #[case] operation: Operation,
    ) {
        assert_eq!(stage.operation(), operation);
    }
}
