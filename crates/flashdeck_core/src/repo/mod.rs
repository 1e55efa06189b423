//! Repository layer: the generic CRUD contract and its persistence backends.
//!
//! # Responsibility
//! - Define a backend-agnostic CRUD contract over schema-described records.
//! - Provide a relational (SQLite) and a document-store implementation.
//! - Map `User` and `Flashcard` entities onto either backend.
//!
//! # Invariants
//! - Every field name reaching a backend is checked against the collection
//!   allow-list first; SQL text is never built from unchecked input.
//! - A missing record is `Ok(None)` / `Ok(false)`, never an error.
//! - Failures propagate immediately; nothing is retried.

pub mod crud;
pub mod document_crud;
pub mod document_store;
pub mod flashcard_repo;
pub mod schema;
pub mod sqlite_crud;
pub mod user_repo;

use crate::db::DbError;
use crate::repo::document_store::DocumentStoreError;
use crate::repo::schema::FieldKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, PersistenceError>;

/// Failure of a repository operation.
#[derive(Debug)]
pub enum PersistenceError {
    /// Collection schema is malformed or does not match the backend.
    InvalidSchema(String),
    /// Field is not in the collection allow-list.
    UnknownField {
        collection: &'static str,
        field: String,
    },
    /// Caller tried to write the identifier field.
    IdentifierField {
        collection: &'static str,
        field: String,
    },
    /// A required field was absent from a create call.
    MissingField {
        collection: &'static str,
        field: &'static str,
    },
    /// `Null` supplied for a non-nullable field.
    NullField {
        collection: &'static str,
        field: String,
    },
    /// Value kind does not match the declared field kind.
    TypeMismatch {
        collection: &'static str,
        field: String,
        expected: FieldKind,
    },
    /// Value has the right kind but cannot be stored (e.g. NaN).
    InvalidValue {
        collection: &'static str,
        field: String,
        reason: &'static str,
    },
    /// Identifier kind does not match the collection or is blank.
    InvalidId {
        collection: &'static str,
        id: String,
    },
    /// Relational backend failure, including constraint violations.
    Db(DbError),
    /// Document-store backend failure, including duplicate identifiers.
    Store(DocumentStoreError),
    /// Persisted state could not be mapped back to a valid record/entity.
    InvalidData(String),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSchema(message) => write!(f, "invalid collection schema: {message}"),
            Self::UnknownField { collection, field } => {
                write!(f, "unknown field `{field}` for collection `{collection}`")
            }
            Self::IdentifierField { collection, field } => write!(
                f,
                "identifier field `{field}` of collection `{collection}` is immutable"
            ),
            Self::MissingField { collection, field } => {
                write!(f, "missing required field `{field}` for collection `{collection}`")
            }
            Self::NullField { collection, field } => {
                write!(f, "field `{field}` of collection `{collection}` cannot be null")
            }
            Self::TypeMismatch {
                collection,
                field,
                expected,
            } => write!(
                f,
                "field `{field}` of collection `{collection}` expects {expected}"
            ),
            Self::InvalidValue {
                collection,
                field,
                reason,
            } => write!(
                f,
                "invalid value for field `{field}` of collection `{collection}`: {reason}"
            ),
            Self::InvalidId { collection, id } => {
                write!(f, "invalid identifier `{id}` for collection `{collection}`")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for PersistenceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<DocumentStoreError> for PersistenceError {
    fn from(value: DocumentStoreError) -> Self {
        Self::Store(value)
    }
}
