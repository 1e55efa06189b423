//! Allow-listed field schema for repository collections.
//!
//! # Responsibility
//! - Describe one collection: name, identifier field/kind and writable fields.
//! - Check every field set before a backend sees it.
//!
//! # Invariants
//! - Collection and field names match `^[A-Za-z_][A-Za-z0-9_]*$`.
//! - The identifier field never appears among writable fields.
//! - Field names are unique within a collection.

use crate::repo::crud::{FieldValue, Fields, RecordId};
use crate::repo::{PersistenceError, RepoResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Scalar kind of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Real,
    Text,
    /// Epoch milliseconds in the generic model; backends may store it natively.
    Timestamp,
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
            Self::Timestamp => "timestamp",
        };
        f.write_str(label)
    }
}

/// How record identifiers are typed and assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// Backend-generated, monotonically increasing integers.
    Integer,
    /// Opaque strings; generated as UUID v4 when the caller supplies none.
    Text,
}

/// One writable field of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub nullable: bool,
}

impl FieldDef {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
        }
    }
}

/// Static description of one collection (table or document collection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSchema {
    pub name: &'static str,
    pub id_field: &'static str,
    pub id_kind: IdKind,
    pub fields: &'static [FieldDef],
}

impl CollectionSchema {
    /// Checks naming and uniqueness rules.
    ///
    /// Backends call this once at construction, before building any SQL.
    pub fn validate(&self) -> RepoResult<()> {
        for name in [self.name, self.id_field] {
            if !IDENTIFIER_RE.is_match(name) {
                return Err(PersistenceError::InvalidSchema(format!(
                    "`{name}` is not a plain identifier"
                )));
            }
        }
        if self.fields.is_empty() {
            return Err(PersistenceError::InvalidSchema(format!(
                "collection `{}` declares no fields",
                self.name
            )));
        }

        let mut seen = BTreeSet::new();
        for field in self.fields {
            if !IDENTIFIER_RE.is_match(field.name) {
                return Err(PersistenceError::InvalidSchema(format!(
                    "field `{}` of `{}` is not a plain identifier",
                    field.name, self.name
                )));
            }
            if field.name == self.id_field {
                return Err(PersistenceError::InvalidSchema(format!(
                    "identifier `{}` of `{}` cannot also be a writable field",
                    field.name, self.name
                )));
            }
            if !seen.insert(field.name) {
                return Err(PersistenceError::InvalidSchema(format!(
                    "field `{}` of `{}` is declared twice",
                    field.name, self.name
                )));
            }
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Checks one field/value pair against the allow-list.
    pub fn check_value(&self, name: &str, value: &FieldValue) -> RepoResult<&'static FieldDef> {
        if name == self.id_field {
            return Err(PersistenceError::IdentifierField {
                collection: self.name,
                field: name.to_string(),
            });
        }
        let field = self
            .field(name)
            .ok_or_else(|| PersistenceError::UnknownField {
                collection: self.name,
                field: name.to_string(),
            })?;

        match value.kind() {
            None if field.nullable => Ok(field),
            None => Err(PersistenceError::NullField {
                collection: self.name,
                field: name.to_string(),
            }),
            Some(kind) if kind != field.kind => Err(PersistenceError::TypeMismatch {
                collection: self.name,
                field: name.to_string(),
                expected: field.kind,
            }),
            Some(_) => {
                if matches!(value, FieldValue::Real(real) if !real.is_finite()) {
                    return Err(PersistenceError::InvalidValue {
                        collection: self.name,
                        field: name.to_string(),
                        reason: "real values must be finite",
                    });
                }
                Ok(field)
            }
        }
    }

    /// Checks a full field set for insertion: allow-list plus required fields.
    pub fn check_insert(&self, data: &Fields) -> RepoResult<()> {
        self.check_update(data)?;
        if let Some(missing) = self
            .fields
            .iter()
            .find(|field| !field.nullable && !data.contains_key(field.name))
        {
            return Err(PersistenceError::MissingField {
                collection: self.name,
                field: missing.name,
            });
        }
        Ok(())
    }

    /// Checks a partial field set for update.
    pub fn check_update(&self, changes: &Fields) -> RepoResult<()> {
        for (name, value) in changes {
            self.check_value(name, value)?;
        }
        Ok(())
    }

    /// Checks that `id` matches the identifier kind and is not blank.
    pub fn check_id(&self, id: &RecordId) -> RepoResult<()> {
        let valid = match (self.id_kind, id) {
            (IdKind::Integer, RecordId::Int(_)) => true,
            (IdKind::Text, RecordId::Text(text)) => !text.trim().is_empty(),
            _ => false,
        };
        if valid {
            Ok(())
        } else {
            Err(PersistenceError::InvalidId {
                collection: self.name,
                id: id.to_string(),
            })
        }
    }
}
