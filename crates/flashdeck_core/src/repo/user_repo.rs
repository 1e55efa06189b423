//! User repository contract and its record-backed implementation.
//!
//! # Responsibility
//! - Persist and reload `User` entities through any `CrudRepository`.
//! - Provide the secondary lookup by email used by the uniqueness check.
//!
//! # Invariants
//! - Records read back are rebuilt through `User::restore`; persisted state
//!   that breaks an entity invariant surfaces as `InvalidData`.
//! - Email uniqueness is not enforced here.

use crate::model::user::User;
use crate::repo::crud::{CrudRepository, FieldValue, Fields, PageQuery, Record, RecordId};
use crate::repo::schema::{CollectionSchema, FieldDef, FieldKind, IdKind};
use crate::repo::{PersistenceError, RepoResult};

/// Collection layout shared by both backends.
pub const USERS_SCHEMA: CollectionSchema = CollectionSchema {
    name: "users",
    id_field: "id",
    id_kind: IdKind::Text,
    fields: &[
        FieldDef::required("email", FieldKind::Text),
        FieldDef::required("name", FieldKind::Text),
        FieldDef::required("created_at", FieldKind::Timestamp),
        FieldDef::optional("updated_at", FieldKind::Timestamp),
    ],
};

/// Entity-level persistence for users.
pub trait UserRepository {
    fn find_by_id(&self, id: &str) -> RepoResult<Option<User>>;
    /// Returns the first user (identifier order) with exactly this email.
    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn find_all(&self, page: &PageQuery) -> RepoResult<Vec<User>>;
    /// Creates or overwrites the user under its own id.
    fn save(&self, user: &User) -> RepoResult<User>;
    fn delete(&self, id: &str) -> RepoResult<bool>;
    fn count(&self) -> RepoResult<u64>;
}

impl<T: UserRepository + ?Sized> UserRepository for &T {
    fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        (**self).find_by_id(id)
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        (**self).find_by_email(email)
    }

    fn find_all(&self, page: &PageQuery) -> RepoResult<Vec<User>> {
        (**self).find_all(page)
    }

    fn save(&self, user: &User) -> RepoResult<User> {
        (**self).save(user)
    }

    fn delete(&self, id: &str) -> RepoResult<bool> {
        (**self).delete(id)
    }

    fn count(&self) -> RepoResult<u64> {
        (**self).count()
    }
}

/// `UserRepository` over a generic record repository.
pub struct RecordUserRepository<R: CrudRepository> {
    records: R,
}

impl<R: CrudRepository> RecordUserRepository<R> {
    /// Wraps `records`, which must serve `USERS_SCHEMA`.
    pub fn try_new(records: R) -> RepoResult<Self> {
        if records.schema() != &USERS_SCHEMA {
            return Err(PersistenceError::InvalidSchema(format!(
                "user repository needs the `users` schema, got `{}`",
                records.schema().name
            )));
        }
        Ok(Self { records })
    }
}

impl<R: CrudRepository> UserRepository for RecordUserRepository<R> {
    fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        self.records
            .get_by_id(&RecordId::from(id))?
            .map(|record| user_from_record(&record))
            .transpose()
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.records
            .find_by_field("email", &FieldValue::from(email), Some(1))?
            .first()
            .map(user_from_record)
            .transpose()
    }

    fn find_all(&self, page: &PageQuery) -> RepoResult<Vec<User>> {
        self.records
            .get_all(page)?
            .iter()
            .map(user_from_record)
            .collect()
    }

    fn save(&self, user: &User) -> RepoResult<User> {
        let record = self
            .records
            .save(&RecordId::from(user.id()), &user_to_fields(user))?;
        user_from_record(&record)
    }

    fn delete(&self, id: &str) -> RepoResult<bool> {
        self.records.delete(&RecordId::from(id))
    }

    fn count(&self) -> RepoResult<u64> {
        self.records.count()
    }
}

fn user_to_fields(user: &User) -> Fields {
    let mut fields = Fields::new();
    fields.insert("email".to_string(), FieldValue::from(user.email()));
    fields.insert("name".to_string(), FieldValue::from(user.name()));
    fields.insert(
        "created_at".to_string(),
        FieldValue::Timestamp(user.created_at()),
    );
    fields.insert(
        "updated_at".to_string(),
        user.updated_at().map_or(FieldValue::Null, FieldValue::Timestamp),
    );
    fields
}

fn user_from_record(record: &Record) -> RepoResult<User> {
    User::restore(
        record.text_id()?,
        record.text("email")?,
        record.text("name")?,
        record.timestamp("created_at")?,
        record.optional_timestamp("updated_at")?,
    )
    .map_err(|err| {
        PersistenceError::InvalidData(format!("stored user `{}` is invalid: {err}", record.id))
    })
}
