//! Tests for staff account administration.

use std::sync::Arc;

use mockall::predicate::eq;
use pagination::PageRequest;
use rstest::rstest;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{
    FixturePasswordHasher, MockPasswordHasher, MockUserRepository, UserCounts,
};
use crate::test_support::{MutableClock, fixed_now, user_with_role};

fn service(users: MockUserRepository) -> UserAdminService<MockUserRepository> {
    UserAdminService::new(
        Arc::new(users),
        Arc::new(FixturePasswordHasher),
        Arc::new(MutableClock::new(fixed_now())),
    )
}

fn request(name: &str, email: &str, password: &str, role: &str) -> CreateUserRequest {
    CreateUserRequest {
        name: Some(name.to_owned()),
        email: Some(email.to_owned()),
        password: Some(password.to_owned()),
        role: Some(role.to_owned()),
    }
}

#[tokio::test]
async fn create_hashes_password_and_stores_active_account() {
    let admin = user_with_role(Role::Admin);
    let mut users = MockUserRepository::new();
    users
        .expect_create()
        .withf(|account| {
            account.password_hash == "fixture$s3cretpass"
                && account.user.email.as_ref() == "new.verifier@bank.test"
                && account.user.is_active
        })
        .times(1)
        .return_once(|_| Ok(()));

    let user = service(users)
        .create(
            &admin,
            request("New Verifier", "New.Verifier@Bank.test", "s3cretpass", "verifier"),
        )
        .await
        .expect("create succeeds");

    assert_eq!(user.role, Role::Verifier);
    assert_eq!(user.created_at, fixed_now());
}

#[tokio::test]
async fn create_reports_every_invalid_field() {
    let mut users = MockUserRepository::new();
    users.expect_create().times(0);

    let err = service(users)
        .create(
            &user_with_role(Role::Admin),
            CreateUserRequest {
                name: Some("A".to_owned()),
                email: Some("not-an-email".to_owned()),
                password: Some("short".to_owned()),
                role: None,
            },
        )
        .await
        .expect_err("invalid");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    let fields: Vec<_> = err.errors().iter().map(|v| v.field.as_str()).collect();
    assert_eq!(fields, ["name", "email", "password", "role"]);
}

#[tokio::test]
async fn duplicate_email_is_a_field_error() {
    let mut users = MockUserRepository::new();
    users
        .expect_create()
        .return_once(|_| Err(UserRepositoryError::duplicate_email("taken@bank.test")));

    let err = service(users)
        .create(
            &user_with_role(Role::Admin),
            request("Taken Name", "taken@bank.test", "password123", "admin"),
        )
        .await
        .expect_err("duplicate");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.errors()[0].field, "email");
    assert_eq!(err.errors()[0].code, "email_taken");
}

#[tokio::test]
async fn hashing_failure_is_internal() {
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .return_once(|_| Err(PasswordHashError::hash("out of memory")));
    let mut users = MockUserRepository::new();
    users.expect_create().times(0);
    let service = UserAdminService::new(
        Arc::new(users),
        Arc::new(hasher),
        Arc::new(MutableClock::new(fixed_now())),
    );

    let err = service
        .create(
            &user_with_role(Role::Admin),
            request("Some Body", "some@bank.test", "password123", "admin"),
        )
        .await
        .expect_err("hash failure");

    assert_eq!(err.code(), ErrorCode::InternalError);
}

#[tokio::test]
async fn verifiers_cannot_manage_users() {
    let mut users = MockUserRepository::new();
    users.expect_list().times(0);

    let err = service(users)
        .list(&user_with_role(Role::Verifier), None, PageRequest::default())
        .await
        .expect_err("forbidden");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn list_passes_role_filter_and_paginates() {
    let mut users = MockUserRepository::new();
    users
        .expect_list()
        .with(eq(Some(Role::Verifier)), eq(PageRequest::default()))
        .return_once(|_, _| Ok((vec![user_with_role(Role::Verifier)], 12)));

    let page = service(users)
        .list(
            &user_with_role(Role::Admin),
            Some(Role::Verifier),
            PageRequest::default(),
        )
        .await
        .expect("list succeeds");

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.pagination.total_pages, 2);
    assert!(page.pagination.has_next_page);
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test]
async fn acting_on_self_is_rejected(#[case] activate: bool) {
    let admin = user_with_role(Role::Admin);
    let mut users = MockUserRepository::new();
    users.expect_set_active().times(0);
    let service = service(users);

    let result = if activate {
        service.activate(&admin, &admin.id).await
    } else {
        service.deactivate(&admin, &admin.id).await
    };

    assert_eq!(
        result.expect_err("self").code(),
        ErrorCode::InvalidRequest
    );
}

#[tokio::test]
async fn deactivate_clears_active_flag() {
    let target = user_with_role(Role::Verifier);
    let target_id = target.id;
    let mut users = MockUserRepository::new();
    users
        .expect_set_active()
        .with(eq(target_id), eq(false), eq(fixed_now()))
        .times(1)
        .return_once(move |_, _, at| {
            Ok(Some(User {
                is_active: false,
                updated_at: at,
                ..target
            }))
        });

    let user = service(users)
        .deactivate(&user_with_role(Role::Admin), &target_id)
        .await
        .expect("deactivate succeeds");

    assert!(!user.is_active);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let mut users = MockUserRepository::new();
    users.expect_set_active().return_once(|_, _, _| Ok(None));

    let err = service(users)
        .activate(&user_with_role(Role::Admin), &UserId::random())
        .await
        .expect_err("missing");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

fn counts(admins: u64) -> UserCounts {
    UserCounts {
        total: admins,
        active: admins,
        inactive: 0,
        admins,
        verifiers: 0,
    }
}

#[tokio::test]
async fn bootstrap_creates_first_admin() {
    let mut users = MockUserRepository::new();
    users.expect_counts().return_once(|| Ok(counts(0)));
    users
        .expect_create()
        .withf(|account| account.user.role == Role::Admin)
        .times(1)
        .return_once(|_| Ok(()));

    let user = service(users)
        .bootstrap_admin("First Admin", "root@bank.test", "s3cretpass")
        .await
        .expect("bootstrap succeeds");

    assert_eq!(user.role, Role::Admin);
}

#[tokio::test]
async fn bootstrap_refuses_when_an_admin_exists() {
    let mut users = MockUserRepository::new();
    users.expect_counts().return_once(|| Ok(counts(1)));
    users.expect_create().times(0);

    let err = service(users)
        .bootstrap_admin("Second Admin", "again@bank.test", "s3cretpass")
        .await
        .expect_err("already bootstrapped");

    assert_eq!(err.code(), ErrorCode::Conflict);
}
