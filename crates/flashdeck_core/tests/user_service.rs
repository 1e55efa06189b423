mod common;

use common::{with_each_backend, ScriptedGenerator};
use flashdeck_core::{PageQuery, ServiceError, ValidationError};

fn no_generator() -> ScriptedGenerator {
    ScriptedGenerator::replying("")
}

#[test]
fn create_user_persists_and_can_be_read_back() {
    with_each_backend(&no_generator(), |app| {
        let users = app.users();
        let created = users.create_user("a@b.com", "Ann").unwrap();
        assert_eq!(created.updated_at(), None);

        let loaded = users.get_user(created.id()).unwrap();
        assert_eq!(loaded, created);
        assert_eq!(users.count_users().unwrap(), 1);
    });
}

#[test]
fn duplicate_email_is_rejected_with_domain_error() {
    with_each_backend(&no_generator(), |app| {
        let users = app.users();
        users.create_user("a@b.com", "Ann").unwrap();

        let err = users.create_user("a@b.com", "Another Ann").unwrap_err();
        assert!(matches!(err, ServiceError::EmailAlreadyExists(_)));
        assert!(err.to_string().contains("email already exists"));
        assert_eq!(users.count_users().unwrap(), 1);
    });
}

#[test]
fn invalid_input_fails_before_storage() {
    with_each_backend(&no_generator(), |app| {
        let users = app.users();
        assert!(matches!(
            users.create_user("not-an-email", "Ann"),
            Err(ServiceError::Validation(ValidationError::InvalidEmail(_)))
        ));
        assert!(matches!(
            users.create_user("a@b.com", ""),
            Err(ServiceError::Validation(ValidationError::EmptyName))
        ));
        assert_eq!(users.count_users().unwrap(), 0);
    });
}

#[test]
fn update_user_changes_fields_and_stamps_updated_at() {
    with_each_backend(&no_generator(), |app| {
        let users = app.users();
        let created = users.create_user("a@b.com", "Ann").unwrap();

        let updated = users
            .update_user(created.id(), "c@d.com", "Anna")
            .unwrap();
        assert_eq!(updated.id(), created.id());
        assert_eq!(updated.email(), "c@d.com");
        assert_eq!(updated.name(), "Anna");
        assert_eq!(updated.created_at(), created.created_at());
        assert!(updated.updated_at().is_some());
        assert_eq!(users.get_user(created.id()).unwrap(), updated);
    });
}

#[test]
fn update_user_rejects_email_owned_by_another_user() {
    with_each_backend(&no_generator(), |app| {
        let users = app.users();
        let ann = users.create_user("a@b.com", "Ann").unwrap();
        users.create_user("bob@b.com", "Bob").unwrap();

        let err = users
            .update_user(ann.id(), "bob@b.com", "Ann")
            .unwrap_err();
        assert!(matches!(err, ServiceError::EmailInUse(_)));
        assert_eq!(err.to_string(), "email already in use by another user");

        let kept = users.update_user(ann.id(), "a@b.com", "Ann B").unwrap();
        assert_eq!(kept.email(), "a@b.com");
        assert_eq!(kept.name(), "Ann B");
    });
}

#[test]
fn missing_users_are_reported_as_not_found() {
    with_each_backend(&no_generator(), |app| {
        let users = app.users();
        assert!(matches!(
            users.get_user("missing"),
            Err(ServiceError::UserNotFound(_))
        ));
        assert!(matches!(
            users.update_user("missing", "a@b.com", "Ann"),
            Err(ServiceError::UserNotFound(_))
        ));
        assert!(matches!(
            users.delete_user("missing"),
            Err(ServiceError::UserNotFound(_))
        ));
    });
}

#[test]
fn delete_user_removes_the_record() {
    with_each_backend(&no_generator(), |app| {
        let users = app.users();
        let created = users.create_user("a@b.com", "Ann").unwrap();

        users.delete_user(created.id()).unwrap();
        assert!(matches!(
            users.get_user(created.id()),
            Err(ServiceError::UserNotFound(_))
        ));
        assert_eq!(users.count_users().unwrap(), 0);

        users.create_user("a@b.com", "Ann again").unwrap();
    });
}

#[test]
fn list_users_honors_pagination() {
    with_each_backend(&no_generator(), |app| {
        let users = app.users();
        for index in 0..5 {
            users
                .create_user(&format!("user{index}@b.com"), "User")
                .unwrap();
        }

        let all = users.list_users(&PageQuery::default()).unwrap();
        assert_eq!(all.len(), 5);
        let page = users.list_users(&PageQuery::new(Some(2), 1)).unwrap();
        assert_eq!(page, all[1..3].to_vec());
    });
}
