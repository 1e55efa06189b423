//! Document-store implementation of the CRUD contract.
//!
//! # Responsibility
//! - Map schema-shaped records onto documents keyed by text identifiers.
//! - Convert timestamps between `EpochMillis` and the store-native
//!   `DocTimestamp` at every read/write boundary.
//!
//! # Invariants
//! - Only `IdKind::Text` schemas are accepted.
//! - Created documents carry every schema field (`null` for absent nullable
//!   fields), so reads from both backends have the same shape.
//! - Pagination is applied over identifier order, same as the relational
//!   backend.
//! - `save` is one store upsert; concurrent saves of one id never collide.

use crate::repo::crud::{CrudRepository, FieldValue, Fields, PageQuery, Record, RecordId};
use crate::repo::document_store::{DocTimestamp, Document, DocumentStore};
use crate::repo::schema::{CollectionSchema, FieldKind, IdKind};
use crate::repo::{PersistenceError, RepoResult};
use log::{debug, error, info};
use serde_json::{Number, Value};
use uuid::Uuid;

/// Document-store-backed repository for one collection.
pub struct DocumentCrudRepository<'store> {
    store: &'store DocumentStore,
    schema: CollectionSchema,
}

impl<'store> DocumentCrudRepository<'store> {
    /// Constructs a repository over an open store.
    ///
    /// # Errors
    /// - `InvalidSchema` for malformed schemas or integer identifiers.
    pub fn try_new(store: &'store DocumentStore, schema: CollectionSchema) -> RepoResult<Self> {
        schema.validate()?;
        if schema.id_kind != IdKind::Text {
            return Err(PersistenceError::InvalidSchema(format!(
                "document collection `{}` requires text identifiers",
                schema.name
            )));
        }
        Ok(Self { store, schema })
    }

    fn encode_document(&self, data: &Fields) -> RepoResult<Document> {
        let mut document = Document::new();
        for field in self.schema.fields {
            let value = match data.get(field.name) {
                Some(value) => encode_value(&self.schema, field.name, value)?,
                None => Value::Null,
            };
            document.insert(field.name.to_string(), value);
        }
        Ok(document)
    }

    fn encode_patch(&self, changes: &Fields) -> RepoResult<Document> {
        changes
            .iter()
            .map(|(name, value)| Ok((name.clone(), encode_value(&self.schema, name, value)?)))
            .collect()
    }

    fn decode(&self, id: String, document: &Document) -> RepoResult<Record> {
        let mut fields = Fields::new();
        for field in self.schema.fields {
            let raw = document.get(field.name).unwrap_or(&Value::Null);
            let value = decode_value(field.kind, raw).ok_or_else(|| {
                PersistenceError::InvalidData(format!(
                    "document `{id}` in `{}` has invalid {} value for `{}`: {raw}",
                    self.schema.name, field.kind, field.name
                ))
            })?;
            if value.is_null() && !field.nullable {
                return Err(PersistenceError::InvalidData(format!(
                    "document `{id}` in `{}` is missing required field `{}`",
                    self.schema.name, field.name
                )));
            }
            fields.insert(field.name.to_string(), value);
        }
        Ok(Record {
            id: RecordId::Text(id),
            fields,
        })
    }

    fn decode_all(&self, documents: Vec<(String, Document)>) -> RepoResult<Vec<Record>> {
        documents
            .into_iter()
            .map(|(id, document)| self.decode(id, &document))
            .collect()
    }

    fn text_id<'a>(&self, id: &'a RecordId) -> RepoResult<&'a str> {
        self.schema.check_id(id)?;
        match id {
            RecordId::Text(value) => Ok(value),
            RecordId::Int(_) => Err(PersistenceError::InvalidId {
                collection: self.schema.name,
                id: id.to_string(),
            }),
        }
    }

    fn logged<T>(&self, operation: &'static str, result: RepoResult<T>) -> RepoResult<T> {
        if let Err(err) = &result {
            error!(
                "event=repo_{operation} module=repo backend=documents status=error collection={} error={err}",
                self.schema.name
            );
        }
        result
    }
}

impl CrudRepository for DocumentCrudRepository<'_> {
    fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    fn create(&self, data: &Fields) -> RepoResult<Record> {
        debug!(
            "event=repo_create module=repo backend=documents status=start collection={} fields={}",
            self.schema.name,
            data.len()
        );
        self.create_with_id(RecordId::Text(Uuid::new_v4().to_string()), data)
    }

    fn create_with_id(&self, id: RecordId, data: &Fields) -> RepoResult<Record> {
        let result = self.text_id(&id).and_then(|text_id| {
            self.schema.check_insert(data)?;
            let document = self.encode_document(data)?;
            self.store
                .insert(self.schema.name, text_id, document.clone())?;
            self.decode(text_id.to_string(), &document)
        });
        let record = self.logged("create", result)?;
        info!(
            "event=repo_create module=repo backend=documents status=ok collection={} id={}",
            self.schema.name, record.id
        );
        Ok(record)
    }

    fn get_by_id(&self, id: &RecordId) -> RepoResult<Option<Record>> {
        debug!(
            "event=repo_get module=repo backend=documents collection={} id={id}",
            self.schema.name
        );
        let result = self.text_id(id).and_then(|text_id| {
            match self.store.get(self.schema.name, text_id)? {
                Some(document) => self.decode(text_id.to_string(), &document).map(Some),
                None => Ok(None),
            }
        });
        self.logged("get", result)
    }

    fn get_all(&self, page: &PageQuery) -> RepoResult<Vec<Record>> {
        let result = self.store.list(self.schema.name).map_err(PersistenceError::from).and_then(
            |documents| {
                let window = documents
                    .into_iter()
                    .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
                    .take(page.limit.map_or(usize::MAX, |limit| {
                        usize::try_from(limit).unwrap_or(usize::MAX)
                    }))
                    .collect();
                self.decode_all(window)
            },
        );
        let records = self.logged("list", result)?;
        debug!(
            "event=repo_list module=repo backend=documents status=ok collection={} count={}",
            self.schema.name,
            records.len()
        );
        Ok(records)
    }

    fn find_by_field(
        &self,
        field: &str,
        value: &FieldValue,
        limit: Option<u32>,
    ) -> RepoResult<Vec<Record>> {
        let result = self.schema.check_value(field, value).and_then(|def| {
            let needle = encode_value(&self.schema, def.name, value)?;
            let limit = limit.map(|limit| usize::try_from(limit).unwrap_or(usize::MAX));
            let documents = self
                .store
                .query_eq(self.schema.name, def.name, &needle, limit)?;
            self.decode_all(documents)
        });
        self.logged("find", result)
    }

    fn update(&self, id: &RecordId, changes: &Fields) -> RepoResult<Option<Record>> {
        let text_id = self.logged("update", self.text_id(id))?;
        self.logged("update", self.schema.check_update(changes))?;

        if changes.is_empty() {
            debug!(
                "event=repo_update module=repo backend=documents status=noop collection={} id={id}",
                self.schema.name
            );
            return self.get_by_id(id);
        }

        let result = self.encode_patch(changes).and_then(|patch| {
            match self.store.update(self.schema.name, text_id, patch)? {
                Some(document) => self.decode(text_id.to_string(), &document).map(Some),
                None => Ok(None),
            }
        });
        let updated = self.logged("update", result)?;
        if updated.is_some() {
            info!(
                "event=repo_update module=repo backend=documents status=ok collection={} id={id} fields={}",
                self.schema.name,
                changes.len()
            );
        }
        Ok(updated)
    }

    fn delete(&self, id: &RecordId) -> RepoResult<bool> {
        let result = self
            .text_id(id)
            .and_then(|text_id| Ok(self.store.delete(self.schema.name, text_id)?));
        let deleted = self.logged("delete", result)?;
        info!(
            "event=repo_delete module=repo backend=documents status=ok collection={} id={id} deleted={deleted}",
            self.schema.name
        );
        Ok(deleted)
    }

    /// Merges into an existing document or inserts a full one under one lock.
    fn save(&self, id: &RecordId, data: &Fields) -> RepoResult<Record> {
        let result = self.text_id(id).and_then(|text_id| {
            self.schema.check_update(data)?;
            let patch = self.encode_patch(data)?;
            let create = self
                .schema
                .check_insert(data)
                .and_then(|()| self.encode_document(data));
            let (create, rejected) = match create {
                Ok(document) => (Some(document), None),
                Err(err) => (None, Some(err)),
            };
            match self.store.upsert(self.schema.name, text_id, patch, create)? {
                Some(document) => self.decode(text_id.to_string(), &document),
                None => Err(rejected.unwrap_or_else(|| {
                    PersistenceError::InvalidData(format!(
                        "document `{text_id}` in `{}` was neither updated nor created",
                        self.schema.name
                    ))
                })),
            }
        });
        let record = self.logged("save", result)?;
        info!(
            "event=repo_save module=repo backend=documents status=ok collection={} id={id}",
            self.schema.name
        );
        Ok(record)
    }

    fn count(&self) -> RepoResult<u64> {
        let result = self
            .store
            .count(self.schema.name)
            .map_err(PersistenceError::from);
        self.logged("count", result)
    }
}

fn encode_value(schema: &CollectionSchema, field: &str, value: &FieldValue) -> RepoResult<Value> {
    Ok(match value {
        FieldValue::Null => Value::Null,
        FieldValue::Integer(value) => Value::from(*value),
        FieldValue::Real(value) => Number::from_f64(*value).map(Value::Number).ok_or_else(|| {
            PersistenceError::InvalidValue {
                collection: schema.name,
                field: field.to_string(),
                reason: "real values must be finite",
            }
        })?,
        FieldValue::Text(value) => Value::String(value.clone()),
        FieldValue::Timestamp(millis) => DocTimestamp::from_epoch_ms(*millis).to_value(),
    })
}

/// Decodes one stored value; `None` means the stored shape is wrong for `kind`.
fn decode_value(kind: FieldKind, raw: &Value) -> Option<FieldValue> {
    if raw.is_null() {
        return Some(FieldValue::Null);
    }
    match kind {
        FieldKind::Integer => raw.as_i64().map(FieldValue::Integer),
        FieldKind::Real => raw.as_f64().map(FieldValue::Real),
        FieldKind::Text => raw.as_str().map(|text| FieldValue::Text(text.to_string())),
        FieldKind::Timestamp => {
            DocTimestamp::from_value(raw).map(|ts| FieldValue::Timestamp(ts.to_epoch_ms()))
        }
    }
}
