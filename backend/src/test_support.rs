//! Shared builders and doubles for unit tests inside the crate.

use std::sync::Mutex;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::loan::ApplicationForm;
use crate::domain::{
    EmailAddress, EmploymentStatus, Loan, LoanId, LoanStatus, PersonName, Role, User, UserId,
};

/// Fixed instant used across tests: 2025-03-15T12:00:00Z.
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0) {
        chrono::LocalResult::Single(now) => now,
        _ => panic!("fixed instant is valid"),
    }
}

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Active user with `role` and a unique email.
pub fn user_with_role(role: Role) -> User {
    let id = UserId::random();
    let now = fixed_now();
    User {
        id,
        name: PersonName::new(format!("{role} user")).expect("valid name"),
        email: EmailAddress::new(format!("{role}-{id}@bank.test")).expect("valid email"),
        role,
        is_active: true,
        last_login_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// Loan in `status` without any decision fields set.
pub fn sample_loan(status: LoanStatus) -> Loan {
    let now = fixed_now();
    Loan {
        id: LoanId::random(),
        applicant_name: PersonName::new("Jane Doe").expect("valid name"),
        email: EmailAddress::new("jane@x.com").expect("valid email"),
        phone: "555-0100".to_owned(),
        amount: 5_000.0,
        purpose: "Home improvement".to_owned(),
        employment_status: EmploymentStatus::Employed,
        monthly_income: 4_200.0,
        credit_score: Some(720),
        status,
        verified_by: None,
        verified_at: None,
        approved_by: None,
        approved_at: None,
        rejection_reason: None,
        documents: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

/// Complete, valid application form for `email`.
pub fn valid_form(email: &str) -> ApplicationForm {
    ApplicationForm {
        applicant_name: Some("Jane Doe".to_owned().into()),
        email: Some(email.to_owned().into()),
        phone: Some("555-0100".to_owned().into()),
        amount: Some(5_000.0.into()),
        purpose: Some("Home improvement".to_owned().into()),
        employment_status: Some("employed".to_owned().into()),
        monthly_income: Some(4_200.0.into()),
        credit_score: Some(720.into()),
        documents: None,
    }
}
