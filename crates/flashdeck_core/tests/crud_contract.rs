use flashdeck_core::db::open_db_in_memory;
use flashdeck_core::repo::crud::{fields, CrudRepository, FieldValue, Fields, PageQuery, RecordId};
use flashdeck_core::repo::document_crud::DocumentCrudRepository;
use flashdeck_core::repo::document_store::DocumentStore;
use flashdeck_core::repo::sqlite_crud::SqliteCrudRepository;
use flashdeck_core::repo::user_repo::USERS_SCHEMA;
use flashdeck_core::repo::PersistenceError;

const CREATED_AT: i64 = 1_700_000_000_123;

fn with_each_backend(check: impl Fn(&dyn CrudRepository)) {
    let conn = open_db_in_memory().unwrap();
    check(&SqliteCrudRepository::try_new(&conn, USERS_SCHEMA).unwrap());

    let store = DocumentStore::in_memory();
    check(&DocumentCrudRepository::try_new(&store, USERS_SCHEMA).unwrap());
}

fn user_fields(email: &str, name: &str) -> Fields {
    let mut data = fields([("email", email), ("name", name)]);
    data.insert("created_at".to_string(), FieldValue::Timestamp(CREATED_AT));
    data
}

fn ids(records: &[flashdeck_core::Record]) -> Vec<String> {
    records.iter().map(|record| record.id.to_string()).collect()
}

#[test]
fn create_then_get_by_id_round_trips() {
    with_each_backend(|repo| {
        let created = repo.create(&user_fields("a@b.com", "Ann")).unwrap();
        assert!(matches!(created.id, RecordId::Text(_)));
        assert_eq!(created.get("email"), Some(&FieldValue::from("a@b.com")));
        assert_eq!(
            created.get("created_at"),
            Some(&FieldValue::Timestamp(CREATED_AT))
        );
        assert_eq!(created.get("updated_at"), Some(&FieldValue::Null));

        let loaded = repo.get_by_id(&created.id).unwrap();
        assert_eq!(loaded, Some(created));
    });
}

#[test]
fn never_created_ids_are_absent_not_errors() {
    with_each_backend(|repo| {
        let missing = RecordId::from("missing");
        assert_eq!(repo.get_by_id(&missing).unwrap(), None);
        assert!(!repo.delete(&missing).unwrap());
        assert_eq!(
            repo.update(&missing, &fields([("name", "Nobody")])).unwrap(),
            None
        );
    });
}

#[test]
fn update_with_empty_field_set_is_a_plain_read() {
    with_each_backend(|repo| {
        let created = repo.create(&user_fields("a@b.com", "Ann")).unwrap();
        let unchanged = repo.update(&created.id, &Fields::new()).unwrap();
        assert_eq!(unchanged, Some(created));
    });
}

#[test]
fn update_applies_only_supplied_fields() {
    with_each_backend(|repo| {
        let created = repo.create(&user_fields("a@b.com", "Ann")).unwrap();
        let mut changes = fields([("name", "Anna")]);
        changes.insert("updated_at".to_string(), FieldValue::Timestamp(CREATED_AT + 5));

        let updated = repo.update(&created.id, &changes).unwrap().unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.get("name"), Some(&FieldValue::from("Anna")));
        assert_eq!(updated.get("email"), Some(&FieldValue::from("a@b.com")));
        assert_eq!(
            updated.get("updated_at"),
            Some(&FieldValue::Timestamp(CREATED_AT + 5))
        );
        assert_eq!(repo.get_by_id(&created.id).unwrap(), Some(updated));
    });
}

#[test]
fn count_tracks_creates_and_deletes() {
    with_each_backend(|repo| {
        assert_eq!(repo.count().unwrap(), 0);
        let created = (0..4)
            .map(|index| {
                repo.create(&user_fields(&format!("u{index}@b.com"), "User"))
                    .unwrap()
            })
            .collect::<Vec<_>>();
        assert!(repo.delete(&created[0].id).unwrap());
        assert!(repo.delete(&created[2].id).unwrap());
        assert!(!repo.delete(&created[2].id).unwrap());
        assert_eq!(repo.count().unwrap(), 2);
    });
}

#[test]
fn get_all_orders_by_id_and_honors_limit_and_offset() {
    with_each_backend(|repo| {
        for id in ["d", "b", "e", "a", "c"] {
            repo.create_with_id(RecordId::from(id), &user_fields(&format!("{id}@b.com"), id))
                .unwrap();
        }

        assert_eq!(
            ids(&repo.get_all(&PageQuery::default()).unwrap()),
            ["a", "b", "c", "d", "e"]
        );
        assert_eq!(
            ids(&repo.get_all(&PageQuery::new(Some(2), 1)).unwrap()),
            ["b", "c"]
        );
        assert_eq!(ids(&repo.get_all(&PageQuery::new(None, 4)).unwrap()), ["e"]);
        assert!(repo
            .get_all(&PageQuery::new(Some(3), 10))
            .unwrap()
            .is_empty());
    });
}

#[test]
fn find_by_field_filters_by_equality_in_id_order() {
    with_each_backend(|repo| {
        for (id, email) in [("c", "x@b.com"), ("a", "x@b.com"), ("b", "y@b.com")] {
            repo.create_with_id(RecordId::from(id), &user_fields(email, "Same"))
                .unwrap();
        }

        let matches = repo
            .find_by_field("email", &FieldValue::from("x@b.com"), None)
            .unwrap();
        assert_eq!(ids(&matches), ["a", "c"]);

        let first = repo
            .find_by_field("email", &FieldValue::from("x@b.com"), Some(1))
            .unwrap();
        assert_eq!(ids(&first), ["a"]);

        let never_updated = repo
            .find_by_field("updated_at", &FieldValue::Null, None)
            .unwrap();
        assert_eq!(never_updated.len(), 3);
    });
}

#[test]
fn duplicate_supplied_id_is_a_persistence_error() {
    with_each_backend(|repo| {
        let id = RecordId::from("fixed");
        repo.create_with_id(id.clone(), &user_fields("a@b.com", "Ann"))
            .unwrap();
        let err = repo
            .create_with_id(id, &user_fields("b@b.com", "Bob"))
            .unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Db(_) | PersistenceError::Store(_)
        ));
        assert_eq!(repo.count().unwrap(), 1);
    });
}

#[test]
fn save_updates_existing_and_creates_missing_records() {
    with_each_backend(|repo| {
        let id = RecordId::from("upsert");
        let created = repo.save(&id, &user_fields("a@b.com", "Ann")).unwrap();
        assert_eq!(created.id, id);

        let saved = repo.save(&id, &user_fields("a@b.com", "Anna")).unwrap();
        assert_eq!(saved.get("name"), Some(&FieldValue::from("Anna")));
        assert_eq!(repo.count().unwrap(), 1);
    });
}

#[test]
fn structural_violations_are_rejected_before_any_write() {
    with_each_backend(|repo| {
        let mut unknown = user_fields("a@b.com", "Ann");
        unknown.insert("role".to_string(), FieldValue::from("admin"));
        assert!(matches!(
            repo.create(&unknown),
            Err(PersistenceError::UnknownField { .. })
        ));

        let mut with_id = user_fields("a@b.com", "Ann");
        with_id.insert("id".to_string(), FieldValue::from("forged"));
        assert!(matches!(
            repo.create(&with_id),
            Err(PersistenceError::IdentifierField { .. })
        ));

        assert!(matches!(
            repo.create(&fields([("email", "a@b.com")])),
            Err(PersistenceError::MissingField { .. })
        ));

        let mut wrong_kind = user_fields("a@b.com", "Ann");
        wrong_kind.insert("created_at".to_string(), FieldValue::from("yesterday"));
        assert!(matches!(
            repo.create(&wrong_kind),
            Err(PersistenceError::TypeMismatch { .. })
        ));

        assert!(matches!(
            repo.get_by_id(&RecordId::Int(1)),
            Err(PersistenceError::InvalidId { .. })
        ));
        assert_eq!(repo.count().unwrap(), 0);
    });
}
