//! Embedded document store: named collections of JSON documents.
//!
//! # Responsibility
//! - Own document collections keyed by string identifiers.
//! - Optionally persist the whole store to one JSON file.
//! - Define the store-native timestamp value (`DocTimestamp`).
//!
//! # Invariants
//! - Documents are JSON objects; identifiers are not stored inside them.
//! - Listing and queries return documents in identifier order.
//! - A file-backed store rewrites its file (temp file + rename) after every
//!   mutation; a mutation whose write fails is not applied in memory.
//! - All access is serialized through one mutex; last write wins.

use crate::model::timestamp::EpochMillis;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// One stored document body.
pub type Document = Map<String, Value>;

type Collections = BTreeMap<String, BTreeMap<String, Document>>;

const MILLIS_PER_SECOND: i64 = 1_000;
const NANOS_PER_MILLI: i64 = 1_000_000;
const NANOS_PER_SECOND: u32 = 1_000_000_000;

#[derive(Debug)]
pub enum DocumentStoreError {
    Io { path: PathBuf, source: std::io::Error },
    Json(serde_json::Error),
    Duplicate { collection: String, id: String },
    Poisoned,
}

impl Display for DocumentStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "document store I/O failed at `{}`: {source}", path.display())
            }
            Self::Json(err) => write!(f, "document store JSON error: {err}"),
            Self::Duplicate { collection, id } => {
                write!(f, "document `{id}` already exists in `{collection}`")
            }
            Self::Poisoned => write!(f, "document store lock poisoned by a panicked writer"),
        }
    }
}

impl Error for DocumentStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::Duplicate { .. } | Self::Poisoned => None,
        }
    }
}

impl From<serde_json::Error> for DocumentStoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

pub type StoreResult<T> = Result<T, DocumentStoreError>;

/// Store-native point in time, encoded as `{"_seconds": s, "_nanoseconds": n}`.
///
/// Not interchangeable with `EpochMillis`; convert at the repository boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocTimestamp {
    #[serde(rename = "_seconds")]
    pub seconds: i64,
    #[serde(rename = "_nanoseconds")]
    pub nanos: u32,
}

impl DocTimestamp {
    pub fn from_epoch_ms(millis: EpochMillis) -> Self {
        let seconds = millis.div_euclid(MILLIS_PER_SECOND);
        let nanos = millis.rem_euclid(MILLIS_PER_SECOND) * NANOS_PER_MILLI;
        Self {
            seconds,
            // rem_euclid keeps this in 0..1e9.
            nanos: u32::try_from(nanos).unwrap_or(0),
        }
    }

    /// Converts back to epoch milliseconds, dropping sub-millisecond precision.
    pub fn to_epoch_ms(self) -> EpochMillis {
        self.seconds
            .saturating_mul(MILLIS_PER_SECOND)
            .saturating_add(i64::from(self.nanos) / NANOS_PER_MILLI)
    }

    pub fn to_value(self) -> Value {
        let mut object = Map::new();
        object.insert("_seconds".to_string(), Value::from(self.seconds));
        object.insert("_nanoseconds".to_string(), Value::from(self.nanos));
        Value::Object(object)
    }

    /// Parses a native timestamp value; returns `None` for any other shape.
    pub fn from_value(value: &Value) -> Option<Self> {
        let timestamp = Self::deserialize(value).ok()?;
        (timestamp.nanos < NANOS_PER_SECOND).then_some(timestamp)
    }
}

#[derive(Deserialize)]
struct StoreFile {
    collections: Collections,
}

/// Explicitly owned document-store handle.
pub struct DocumentStore {
    path: Option<PathBuf>,
    collections: Mutex<Collections>,
}

impl DocumentStore {
    /// Creates an empty store that lives only in memory.
    pub fn in_memory() -> Self {
        info!("event=docstore_open module=docstore status=ok mode=memory");
        Self {
            path: None,
            collections: Mutex::new(Collections::new()),
        }
    }

    /// Opens a file-backed store, loading existing contents when present.
    ///
    /// # Side effects
    /// - Creates the parent directory when missing.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        info!(
            "event=docstore_open module=docstore status=start mode=file path={}",
            path.display()
        );

        let collections = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<StoreFile>(&bytes)?.collections,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|source| DocumentStoreError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
                Collections::new()
            }
            Err(source) => {
                error!(
                    "event=docstore_open module=docstore status=error path={} error={source}",
                    path.display()
                );
                return Err(DocumentStoreError::Io { path, source });
            }
        };

        info!(
            "event=docstore_open module=docstore status=ok mode=file collections={}",
            collections.len()
        );
        Ok(Self {
            path: Some(path),
            collections: Mutex::new(collections),
        })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let guard = self.lock()?;
        Ok(guard
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    /// Inserts a new document; fails when `id` is already taken.
    pub fn insert(&self, collection: &str, id: &str, document: Document) -> StoreResult<()> {
        self.write(|collections| {
            let documents = collections.entry(collection.to_string()).or_default();
            if documents.contains_key(id) {
                return Err(DocumentStoreError::Duplicate {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            }
            documents.insert(id.to_string(), document);
            Ok(((), true))
        })
    }

    /// Merges `patch` into an existing document, or inserts `create` when the
    /// document is absent. Both branches run under one lock.
    ///
    /// Returns `None` without writing when the document is absent and
    /// `create` is `None`.
    pub fn upsert(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
        create: Option<Document>,
    ) -> StoreResult<Option<Document>> {
        self.write(|collections| {
            let documents = collections.entry(collection.to_string()).or_default();
            if let Some(existing) = documents.get_mut(id) {
                existing.extend(patch);
                return Ok((Some(existing.clone()), true));
            }
            match create {
                Some(document) => {
                    documents.insert(id.to_string(), document.clone());
                    Ok((Some(document), true))
                }
                None => Ok((None, false)),
            }
        })
    }

    /// Merges `patch` into an existing document and returns the result.
    ///
    /// Returns `None` without writing when the document does not exist.
    pub fn update(&self, collection: &str, id: &str, patch: Document) -> StoreResult<Option<Document>> {
        self.write(|collections| {
            let Some(existing) = collections
                .get_mut(collection)
                .and_then(|documents| documents.get_mut(id))
            else {
                return Ok((None, false));
            };
            existing.extend(patch);
            Ok((Some(existing.clone()), true))
        })
    }

    /// Removes a document; returns whether it existed.
    pub fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        self.write(|collections| {
            let removed = collections
                .get_mut(collection)
                .and_then(|documents| documents.remove(id))
                .is_some();
            Ok((removed, removed))
        })
    }

    /// Returns every document of a collection in identifier order.
    pub fn list(&self, collection: &str) -> StoreResult<Vec<(String, Document)>> {
        self.scan(collection, |_| true, None)
    }

    /// Returns documents whose `field` equals `value`, in identifier order.
    ///
    /// A missing key matches `Value::Null`.
    pub fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> StoreResult<Vec<(String, Document)>> {
        self.scan(
            collection,
            |document| document.get(field).unwrap_or(&Value::Null) == value,
            limit,
        )
    }

    pub fn count(&self, collection: &str) -> StoreResult<u64> {
        let guard = self.lock()?;
        let count = guard.get(collection).map_or(0, BTreeMap::len);
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    /// Flushes a file-backed store and releases the handle.
    pub fn close(self) -> StoreResult<()> {
        {
            let guard = self.lock()?;
            self.persist(&guard)?;
        }
        info!("event=docstore_close module=docstore status=ok");
        Ok(())
    }

    fn scan(
        &self,
        collection: &str,
        matches: impl Fn(&Document) -> bool,
        limit: Option<usize>,
    ) -> StoreResult<Vec<(String, Document)>> {
        let guard = self.lock()?;
        let Some(documents) = guard.get(collection) else {
            return Ok(Vec::new());
        };
        let found = documents
            .iter()
            .filter(|(_, document)| matches(document))
            .take(limit.unwrap_or(usize::MAX))
            .map(|(id, document)| (id.clone(), document.clone()))
            .collect::<Vec<_>>();
        debug!(
            "event=docstore_scan module=docstore collection={collection} count={}",
            found.len()
        );
        Ok(found)
    }

    /// Runs one mutation and commits it only once it is durable.
    ///
    /// `apply` returns its result and whether it changed anything. A
    /// file-backed store mutates a copy, persists it, then swaps it in, so a
    /// failed persist leaves the in-memory state untouched.
    fn write<T>(
        &self,
        apply: impl FnOnce(&mut Collections) -> StoreResult<(T, bool)>,
    ) -> StoreResult<T> {
        let mut guard = self.lock()?;
        if self.path.is_none() {
            return apply(&mut *guard).map(|(value, _)| value);
        }

        let mut next = guard.clone();
        let (value, changed) = apply(&mut next)?;
        if changed {
            self.persist(&next)?;
            *guard = next;
        }
        Ok(value)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Collections>> {
        self.collections
            .lock()
            .map_err(|_| DocumentStoreError::Poisoned)
    }

    fn persist(&self, collections: &Collections) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(&StoreFileRef { collections })?;
        let temp_path = path.with_extension("tmp");
        let write = std::fs::write(&temp_path, bytes)
            .and_then(|()| std::fs::rename(&temp_path, path));
        if let Err(source) = write {
            error!(
                "event=docstore_persist module=docstore status=error path={} error={source}",
                path.display()
            );
            return Err(DocumentStoreError::Io {
                path: path.clone(),
                source,
            });
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    collections: &'a Collections,
}
