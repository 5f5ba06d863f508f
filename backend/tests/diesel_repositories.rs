//! Integration tests for the Diesel repositories against embedded PostgreSQL.
//!
//! Each test gets its own cluster and a freshly migrated database. Async
//! repository calls run on a Tokio runtime owned by the test context so the
//! synchronous fixtures can bootstrap and tear down the cluster.

#[path = "support/pg_embed.rs"]
mod pg_embed;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use loan_backend::domain::loan::{
    ApplicationForm, LoanApplication, ReviewDecision, ReviewStage, TransitionPlan, plan_transition,
};
use loan_backend::domain::ports::{
    FixturePasswordHasher, LoanListFilter, LoanRepository, LoanRepositoryError, TransitionOutcome,
    UserRepository,
};
use loan_backend::domain::{
    EmailAddress, Loan, LoanId, LoanStatus, PersonName, Role, User, UserAccount, UserId,
};
use loan_backend::outbound::persistence::{
    DbPool, DieselLoanRepository, DieselUserRepository, PoolConfig, run_migrations,
};
use pagination::PageRequest;
use pg_embed::{handle_cluster_setup_failure, temporary_database, test_cluster};
use pg_embedded_setup_unpriv::{TemporaryDatabase, TestCluster};
use postgres::{Client, NoTls};
use rstest::{fixture, rstest};
use serde_json::json;
use tokio::runtime::Runtime;

struct Store {
    /// Runtime reused for every repository call in the test.
    runtime: Runtime,
    loans: DieselLoanRepository,
    users: DieselUserRepository,
    database_url: String,
    _database: TemporaryDatabase,
    _cluster: TestCluster,
}

impl Store {
    fn staff(&self, name: &str, email: &str, role: Role) -> User {
        let now = at(2026, 1, 5);
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
            password_hash: FixturePasswordHasher::encode("s3cretpass"),
        };
        self.runtime
            .block_on(self.users.create(&account))
            .expect("create user");
        user
    }

    fn submit(&self, email: &str, amount: f64, created_at: DateTime<Utc>) -> Loan {
        let loan = application(email, amount, created_at);
        self.runtime
            .block_on(self.loans.insert(&loan))
            .expect("insert loan");
        loan
    }

    fn decide(
        &self,
        loan: &Loan,
        plan: &TransitionPlan,
    ) -> Result<TransitionOutcome, LoanRepositoryError> {
        self.runtime.block_on(self.loans.transition(&loan.id, plan))
    }
}

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

fn application(email: &str, amount: f64, created_at: DateTime<Utc>) -> Loan {
    let form: ApplicationForm = serde_json::from_value(json!({
        "applicantName": "Jane Doe",
        "email": email,
        "phone": "555-0100",
        "amount": amount,
        "purpose": "Home improvement",
        "employmentStatus": "employed",
        "monthlyIncome": 4200,
        "creditScore": 720,
        "documents": [{ "name": "payslip", "url": "https://files.test/payslip.pdf" }]
    }))
    .expect("form json");
    let application = LoanApplication::validate(form).expect("valid application");
    Loan::submit(application, created_at)
}

fn plan(
    current: LoanStatus,
    stage: ReviewStage,
    action: &str,
    reason: Option<&str>,
    actor: &User,
    when: DateTime<Utc>,
) -> TransitionPlan {
    let decision = ReviewDecision::parse(stage, action, reason).expect("valid decision");
    plan_transition(current, &decision, actor.id, when).expect("legal transition")
}

fn verify(verifier: &User, when: DateTime<Utc>) -> TransitionPlan {
    plan(LoanStatus::Pending, ReviewStage::Verification, "verify", None, verifier, when)
}

fn approve(admin: &User, when: DateTime<Utc>) -> TransitionPlan {
    plan(LoanStatus::Verified, ReviewStage::Approval, "approve", None, admin, when)
}

fn setup_store() -> Result<Store, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = test_cluster()?;
    let database = temporary_database(&cluster)?;
    let database_url = database.url().to_owned();

    runtime
        .block_on(run_migrations(&database_url))
        .map_err(|err| err.to_string())?;
    let config = PoolConfig::new(database_url.as_str())
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    Ok(Store {
        runtime,
        loans: DieselLoanRepository::new(pool.clone()),
        users: DieselUserRepository::new(pool),
        database_url,
        _database: database,
        _cluster: cluster,
    })
}

#[fixture]
fn store() -> Option<Store> {
    match setup_store() {
        Ok(store) => Some(store),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
fn transition_applies_when_status_still_matches(store: Option<Store>) {
    let Some(store) = store else {
        eprintln!("SKIP-TEST-CLUSTER: transition_applies_when_status_still_matches skipped");
        return;
    };
    let verifier = store.staff("Vera Fier", "vera@bank.test", Role::Verifier);
    let loan = store.submit("jane@x.com", 5_000.0, at(2026, 3, 2));
    let when = at(2026, 3, 3);

    let outcome = store.decide(&loan, &verify(&verifier, when));

    let Ok(TransitionOutcome::Applied(updated)) = outcome else {
        panic!("expected applied transition, got {outcome:?}");
    };
    assert_eq!(updated.status, LoanStatus::Verified);
    assert_eq!(updated.verified_by, Some(verifier.id));
    assert_eq!(updated.verified_at, Some(when));
    assert_eq!(updated.approved_by, None);
    assert_eq!(updated.documents.len(), 1);

    let stored = store
        .runtime
        .block_on(store.loans.find_by_id(&loan.id))
        .expect("query")
        .expect("loan exists");
    assert_eq!(stored, updated);
}

#[rstest]
fn stale_transition_reports_current_status(store: Option<Store>) {
    let Some(store) = store else {
        eprintln!("SKIP-TEST-CLUSTER: stale_transition_reports_current_status skipped");
        return;
    };
    let verifier = store.staff("Vera Fier", "vera@bank.test", Role::Verifier);
    let admin = store.staff("Ada Min", "ada@bank.test", Role::Admin);
    let loan = store.submit("jane@x.com", 5_000.0, at(2026, 3, 2));
    let first = verify(&verifier, at(2026, 3, 3));
    store.decide(&loan, &first).expect("first verification");

    let repeated = store.decide(&loan, &first).expect("query");
    assert_eq!(
        repeated,
        TransitionOutcome::StatusMismatch {
            actual: LoanStatus::Verified
        }
    );

    store
        .decide(&loan, &approve(&admin, at(2026, 3, 4)))
        .expect("approval");
    let late_reject = plan(
        LoanStatus::Verified,
        ReviewStage::Approval,
        "reject",
        Some("income unverifiable"),
        &admin,
        at(2026, 3, 5),
    );
    assert_eq!(
        store.decide(&loan, &late_reject).expect("query"),
        TransitionOutcome::StatusMismatch {
            actual: LoanStatus::Approved
        }
    );
}

#[rstest]
fn transition_on_unknown_loan_is_missing(store: Option<Store>) {
    let Some(store) = store else {
        eprintln!("SKIP-TEST-CLUSTER: transition_on_unknown_loan_is_missing skipped");
        return;
    };
    let verifier = store.staff("Vera Fier", "vera@bank.test", Role::Verifier);

    let outcome = store
        .runtime
        .block_on(
            store
                .loans
                .transition(&LoanId::random(), &verify(&verifier, at(2026, 3, 3))),
        )
        .expect("query");

    assert_eq!(outcome, TransitionOutcome::Missing);
}

#[rstest]
fn open_applications_are_unique_per_email(store: Option<Store>) {
    let Some(store) = store else {
        eprintln!("SKIP-TEST-CLUSTER: open_applications_are_unique_per_email skipped");
        return;
    };
    let verifier = store.staff("Vera Fier", "vera@bank.test", Role::Verifier);
    let first = store.submit("jane@x.com", 5_000.0, at(2026, 3, 2));

    let duplicate = application("jane@x.com", 7_500.0, at(2026, 3, 3));
    let err = store
        .runtime
        .block_on(store.loans.insert(&duplicate))
        .expect_err("second open application");
    assert_eq!(
        err,
        LoanRepositoryError::DuplicateOpenApplication {
            email: "jane@x.com".to_owned()
        }
    );

    let rejection = plan(
        LoanStatus::Pending,
        ReviewStage::Verification,
        "reject",
        Some("documents unreadable"),
        &verifier,
        at(2026, 3, 4),
    );
    store.decide(&first, &rejection).expect("rejection");
    store
        .runtime
        .block_on(store.loans.insert(&duplicate))
        .expect("reapply after rejection");

    let open = store
        .runtime
        .block_on(store.loans.find_open_by_email(&duplicate.email))
        .expect("query")
        .expect("open application");
    assert_eq!(open.id, duplicate.id);
}

#[rstest]
fn aggregates_group_by_status_and_month(store: Option<Store>) {
    let Some(store) = store else {
        eprintln!("SKIP-TEST-CLUSTER: aggregates_group_by_status_and_month skipped");
        return;
    };
    let verifier = store.staff("Vera Fier", "vera@bank.test", Role::Verifier);
    let admin = store.staff("Ada Min", "ada@bank.test", Role::Admin);
    let approved = store.submit("a@x.com", 10_000.0, at(2026, 3, 2));
    store.submit("b@x.com", 2_000.0, at(2026, 3, 20));
    store.submit("c@x.com", 4_000.0, at(2026, 4, 1));
    store.submit("old@x.com", 1_000.0, at(2025, 12, 31));
    store
        .decide(&approved, &verify(&verifier, at(2026, 3, 3)))
        .expect("verify");
    store
        .decide(&approved, &approve(&admin, at(2026, 3, 4)))
        .expect("approve");

    let totals = store
        .runtime
        .block_on(store.loans.totals())
        .expect("totals");
    assert_eq!(totals.counts.get(LoanStatus::Pending), 3);
    assert_eq!(totals.counts.get(LoanStatus::Approved), 1);
    assert_eq!(totals.counts.get(LoanStatus::Verified), 0);
    assert_eq!(totals.counts.total(), 4);
    assert!((totals.total_amount - 17_000.0).abs() < f64::EPSILON);
    assert!((totals.approved_amount - 10_000.0).abs() < f64::EPSILON);

    let months = store
        .runtime
        .block_on(store.loans.monthly_activity(at(2026, 1, 1)))
        .expect("monthly activity");
    let summary: Vec<_> = months
        .iter()
        .map(|month| (month.year, month.month, month.applications, month.approved))
        .collect();
    assert_eq!(summary, [(2026, 3, 2, 1), (2026, 4, 1, 0)]);
    assert!((months[0].total_amount - 12_000.0).abs() < f64::EPSILON);

    let since_april = store
        .runtime
        .block_on(store.loans.count_created_since(at(2026, 4, 1)))
        .expect("count");
    assert_eq!(since_april, 1);

    let filter = LoanListFilter {
        status: Some(LoanStatus::Pending),
        search: Some("X.COM".to_owned()),
    };
    let page = PageRequest::new(Some(1), Some(2)).expect("page");
    let (loans, total) = store
        .runtime
        .block_on(store.loans.list(&filter, page))
        .expect("list");
    assert_eq!(total, 3);
    let emails: Vec<&str> = loans.iter().map(|loan| loan.email.as_ref()).collect();
    assert_eq!(emails, ["c@x.com", "b@x.com"]);
}

#[rstest]
fn decisions_are_counted_per_actor_and_stage(store: Option<Store>) {
    let Some(store) = store else {
        eprintln!("SKIP-TEST-CLUSTER: decisions_are_counted_per_actor_and_stage skipped");
        return;
    };
    let verifier = store.staff("Vera Fier", "vera@bank.test", Role::Verifier);
    let admin = store.staff("Ada Min", "ada@bank.test", Role::Admin);
    let first = store.submit("a@x.com", 5_000.0, at(2026, 3, 2));
    let second = store.submit("b@x.com", 5_000.0, at(2026, 3, 2));
    let verified_at = at(2026, 3, 3);
    store
        .decide(&first, &verify(&verifier, verified_at))
        .expect("verify first");
    store
        .decide(&second, &verify(&verifier, verified_at + TimeDelta::days(2)))
        .expect("verify second");
    store
        .decide(&first, &approve(&admin, at(2026, 3, 6)))
        .expect("approve first");

    let count = |actor: &User, stage: ReviewStage, since: Option<DateTime<Utc>>| {
        store
            .runtime
            .block_on(store.loans.count_decisions(&actor.id, stage, since))
            .expect("count decisions")
    };
    assert_eq!(count(&verifier, ReviewStage::Verification, None), 2);
    assert_eq!(
        count(&verifier, ReviewStage::Verification, Some(at(2026, 3, 4))),
        1
    );
    assert_eq!(count(&verifier, ReviewStage::Approval, None), 0);
    assert_eq!(count(&admin, ReviewStage::Approval, None), 1);
    assert_eq!(count(&admin, ReviewStage::Verification, None), 0);
}

#[rstest]
fn user_counts_split_by_role_and_activity(store: Option<Store>) {
    let Some(store) = store else {
        eprintln!("SKIP-TEST-CLUSTER: user_counts_split_by_role_and_activity skipped");
        return;
    };
    store.staff("Ada Min", "ada@bank.test", Role::Admin);
    store.staff("Vera Fier", "vera@bank.test", Role::Verifier);
    let leaver = store.staff("Lee Ver", "lee@bank.test", Role::Verifier);

    let deactivated = store
        .runtime
        .block_on(store.users.set_active(&leaver.id, false, at(2026, 2, 1)))
        .expect("query")
        .expect("user exists");
    assert!(!deactivated.is_active);

    let counts = store
        .runtime
        .block_on(store.users.counts())
        .expect("counts");
    assert_eq!(counts.total, 3);
    assert_eq!(counts.active, 2);
    assert_eq!(counts.inactive, 1);
    assert_eq!(counts.admins, 1);
    assert_eq!(counts.verifiers, 2);
}

#[rstest]
fn dropped_loans_table_surfaces_query_error(store: Option<Store>) {
    let Some(store) = store else {
        eprintln!("SKIP-TEST-CLUSTER: dropped_loans_table_surfaces_query_error skipped");
        return;
    };
    let mut client = Client::connect(&store.database_url, NoTls).expect("postgres client");
    client
        .batch_execute("DROP TABLE loans;")
        .expect("drop loans table");

    let err = store
        .runtime
        .block_on(store.loans.totals())
        .expect_err("missing table");

    assert!(
        matches!(err, LoanRepositoryError::Query { .. }),
        "expected query error, got {err:?}"
    );
}
