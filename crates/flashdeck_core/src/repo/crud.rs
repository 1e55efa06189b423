//! Backend-agnostic CRUD contract.
//!
//! # Responsibility
//! - Define the generic record shape (`RecordId` + `Fields`).
//! - Define the `CrudRepository` operations every backend provides.
//!
//! # Invariants
//! - `get_by_id`/`update` report absence as `None`; `delete` as `false`.
//! - `update` with an empty field set performs no write.
//! - `get_all` returns identifier order and honors `limit`/`offset` on every
//!   backend.
//! - Record identifiers are immutable once created.

use crate::model::timestamp::EpochMillis;
use crate::repo::schema::{CollectionSchema, FieldKind};
use crate::repo::{PersistenceError, RepoResult};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Field name to value mapping for one record, identifier excluded.
pub type Fields = BTreeMap<String, FieldValue>;

/// Scalar value stored in a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Timestamp(EpochMillis),
}

impl FieldValue {
    /// Returns the value kind, or `None` for `Null`.
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            Self::Null => None,
            Self::Integer(_) => Some(FieldKind::Integer),
            Self::Real(_) => Some(FieldKind::Real),
            Self::Text(_) => Some(FieldKind::Text),
            Self::Timestamp(_) => Some(FieldKind::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

/// Record identifier: backend-generated integer or opaque string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One stored record.
///
/// Records read back from a backend carry every schema field; absent
/// nullable values are `FieldValue::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub fields: Fields,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Reads a required text field.
    pub fn text(&self, name: &str) -> RepoResult<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Text(value)) => Ok(value),
            other => Err(unexpected_value(&self.id, name, "text", other)),
        }
    }

    /// Reads a required timestamp field.
    pub fn timestamp(&self, name: &str) -> RepoResult<EpochMillis> {
        match self.fields.get(name) {
            Some(FieldValue::Timestamp(value)) => Ok(*value),
            other => Err(unexpected_value(&self.id, name, "timestamp", other)),
        }
    }

    /// Reads a nullable timestamp field.
    pub fn optional_timestamp(&self, name: &str) -> RepoResult<Option<EpochMillis>> {
        match self.fields.get(name) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(FieldValue::Timestamp(value)) => Ok(Some(*value)),
            other => Err(unexpected_value(&self.id, name, "timestamp", other)),
        }
    }

    /// Returns the identifier as text, rejecting integer ids.
    pub fn text_id(&self) -> RepoResult<&str> {
        match &self.id {
            RecordId::Text(value) => Ok(value),
            RecordId::Int(value) => Err(PersistenceError::InvalidData(format!(
                "expected text identifier, found integer {value}"
            ))),
        }
    }
}

fn unexpected_value(
    id: &RecordId,
    name: &str,
    expected: &str,
    found: Option<&FieldValue>,
) -> PersistenceError {
    PersistenceError::InvalidData(format!(
        "record `{id}` field `{name}`: expected {expected}, found {found:?}"
    ))
}

/// Pagination window for `get_all`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageQuery {
    /// Maximum number of records; `None` means no limit.
    pub limit: Option<u32>,
    /// Number of records to skip.
    pub offset: u32,
}

impl PageQuery {
    pub fn new(limit: Option<u32>, offset: u32) -> Self {
        Self { limit, offset }
    }
}

/// Generic CRUD access to one homogeneous collection.
///
/// Implementations perform structural checks only (allow-list, kinds,
/// required fields); business rules live in the entity layer.
pub trait CrudRepository {
    /// Schema of the collection served by this repository.
    fn schema(&self) -> &CollectionSchema;

    /// Inserts a record and lets the backend assign the identifier.
    fn create(&self, data: &Fields) -> RepoResult<Record>;

    /// Inserts a record under a caller-supplied identifier.
    ///
    /// Fails when the identifier already exists.
    fn create_with_id(&self, id: RecordId, data: &Fields) -> RepoResult<Record>;

    fn get_by_id(&self, id: &RecordId) -> RepoResult<Option<Record>>;

    fn get_all(&self, page: &PageQuery) -> RepoResult<Vec<Record>>;

    /// Equality filter on one allow-listed field, identifier order.
    fn find_by_field(
        &self,
        field: &str,
        value: &FieldValue,
        limit: Option<u32>,
    ) -> RepoResult<Vec<Record>>;

    /// Applies only the supplied fields; an empty set is a plain read.
    fn update(&self, id: &RecordId, changes: &Fields) -> RepoResult<Option<Record>>;

    fn delete(&self, id: &RecordId) -> RepoResult<bool>;

    fn count(&self) -> RepoResult<u64>;

    /// Updates the record when it exists, otherwise creates it under `id`.
    fn save(&self, id: &RecordId, data: &Fields) -> RepoResult<Record> {
        match self.update(id, data)? {
            Some(record) => Ok(record),
            None => self.create_with_id(id.clone(), data),
        }
    }
}

impl<R: CrudRepository + ?Sized> CrudRepository for Box<R> {
    fn schema(&self) -> &CollectionSchema {
        (**self).schema()
    }

    fn create(&self, data: &Fields) -> RepoResult<Record> {
        (**self).create(data)
    }

    fn create_with_id(&self, id: RecordId, data: &Fields) -> RepoResult<Record> {
        (**self).create_with_id(id, data)
    }

    fn get_by_id(&self, id: &RecordId) -> RepoResult<Option<Record>> {
        (**self).get_by_id(id)
    }

    fn get_all(&self, page: &PageQuery) -> RepoResult<Vec<Record>> {
        (**self).get_all(page)
    }

    fn find_by_field(
        &self,
        field: &str,
        value: &FieldValue,
        limit: Option<u32>,
    ) -> RepoResult<Vec<Record>> {
        (**self).find_by_field(field, value, limit)
    }

    fn update(&self, id: &RecordId, changes: &Fields) -> RepoResult<Option<Record>> {
        (**self).update(id, changes)
    }

    fn delete(&self, id: &RecordId) -> RepoResult<bool> {
        (**self).delete(id)
    }

    fn count(&self) -> RepoResult<u64> {
        (**self).count()
    }

    fn save(&self, id: &RecordId, data: &Fields) -> RepoResult<Record> {
        (**self).save(id, data)
    }
}

/// Builds a `Fields` map from `(name, value)` pairs.
pub fn fields<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<FieldValue>,
{
    pairs
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect()
}
