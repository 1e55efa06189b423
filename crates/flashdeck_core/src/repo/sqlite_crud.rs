//! SQLite implementation of the CRUD contract.
//!
//! # Responsibility
//! - Translate contract operations into parameterized SQL for one table.
//! - Map rows back into schema-shaped records.
//!
//! # Invariants
//! - Table and column names come only from a validated `CollectionSchema`
//!   and are always double-quoted; values are always bound parameters.
//! - Timestamps are stored as INTEGER epoch milliseconds.
//! - Integer-id tables rely on SQLite rowid assignment; text-id tables get
//!   UUID v4 identifiers when the caller supplies none.

use crate::repo::crud::{CrudRepository, FieldValue, Fields, PageQuery, Record, RecordId};
use crate::repo::schema::{CollectionSchema, FieldKind, IdKind};
use crate::repo::{PersistenceError, RepoResult};
use log::{debug, error, info};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use uuid::Uuid;

/// SQLite-backed repository for one collection table.
pub struct SqliteCrudRepository<'conn> {
    conn: &'conn Connection,
    schema: CollectionSchema,
    select_sql: String,
}

impl<'conn> SqliteCrudRepository<'conn> {
    /// Constructs a repository over a migrated connection.
    ///
    /// # Errors
    /// - `InvalidSchema` when the schema breaks naming rules, the table is
    ///   missing, or a declared column does not exist.
    pub fn try_new(conn: &'conn Connection, schema: CollectionSchema) -> RepoResult<Self> {
        schema.validate()?;
        ensure_table_matches(conn, &schema)?;

        let mut columns = vec![quote(schema.id_field)];
        columns.extend(schema.fields.iter().map(|field| quote(field.name)));
        let select_sql = format!(
            "SELECT {} FROM {}",
            columns.join(", "),
            quote(schema.name)
        );

        Ok(Self {
            conn,
            schema,
            select_sql,
        })
    }

    fn insert(&self, id: Option<&RecordId>, data: &Fields) -> RepoResult<RecordId> {
        let mut columns = Vec::new();
        let mut values = Vec::new();
        if let Some(id) = id {
            columns.push(quote(self.schema.id_field));
            values.push(id_to_sql(id));
        }
        for (name, value) in data {
            columns.push(quote(name));
            values.push(value_to_sql(value));
        }

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES;", quote(self.schema.name))
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({});",
                quote(self.schema.name),
                columns.join(", "),
                placeholders(columns.len())
            )
        };
        self.conn.execute(&sql, params_from_iter(values))?;

        Ok(match id {
            Some(id) => id.clone(),
            None => RecordId::Int(self.conn.last_insert_rowid()),
        })
    }

    fn read_back(&self, id: &RecordId) -> RepoResult<Record> {
        self.get_by_id(id)?.ok_or_else(|| {
            PersistenceError::InvalidData(format!(
                "record `{id}` of `{}` not found in read-back",
                self.schema.name
            ))
        })
    }

    fn query_records(&self, sql: &str, values: Vec<Value>) -> RepoResult<Vec<Record>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_row(&self.schema, row)?);
        }
        Ok(records)
    }

    fn logged<T>(&self, operation: &'static str, result: RepoResult<T>) -> RepoResult<T> {
        if let Err(err) = &result {
            error!(
                "event=repo_{operation} module=repo backend=sqlite status=error collection={} error={err}",
                self.schema.name
            );
        }
        result
    }
}

impl CrudRepository for SqliteCrudRepository<'_> {
    fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    fn create(&self, data: &Fields) -> RepoResult<Record> {
        debug!(
            "event=repo_create module=repo backend=sqlite status=start collection={} fields={}",
            self.schema.name,
            data.len()
        );
        let result = self.schema.check_insert(data).and_then(|()| {
            let generated = match self.schema.id_kind {
                IdKind::Integer => None,
                IdKind::Text => Some(RecordId::Text(Uuid::new_v4().to_string())),
            };
            let id = self.insert(generated.as_ref(), data)?;
            self.read_back(&id)
        });
        let record = self.logged("create", result)?;
        info!(
            "event=repo_create module=repo backend=sqlite status=ok collection={} id={}",
            self.schema.name, record.id
        );
        Ok(record)
    }

    fn create_with_id(&self, id: RecordId, data: &Fields) -> RepoResult<Record> {
        let result = self
            .schema
            .check_id(&id)
            .and_then(|()| self.schema.check_insert(data))
            .and_then(|()| self.insert(Some(&id), data))
            .and_then(|id| self.read_back(&id));
        let record = self.logged("create", result)?;
        info!(
            "event=repo_create module=repo backend=sqlite status=ok collection={} id={} supplied_id=true",
            self.schema.name, record.id
        );
        Ok(record)
    }

    fn get_by_id(&self, id: &RecordId) -> RepoResult<Option<Record>> {
        debug!(
            "event=repo_get module=repo backend=sqlite collection={} id={id}",
            self.schema.name
        );
        let result = self.schema.check_id(id).and_then(|()| {
            let sql = format!(
                "{} WHERE {} = ?1;",
                self.select_sql,
                quote(self.schema.id_field)
            );
            let mut records = self.query_records(&sql, vec![id_to_sql(id)])?;
            Ok(records.pop())
        });
        self.logged("get", result)
    }

    fn get_all(&self, page: &PageQuery) -> RepoResult<Vec<Record>> {
        let mut sql = format!(
            "{} ORDER BY {} ASC",
            self.select_sql,
            quote(self.schema.id_field)
        );
        let mut values = Vec::new();
        // SQLite only accepts OFFSET after LIMIT; -1 means unbounded.
        if page.limit.is_some() || page.offset > 0 {
            sql.push_str(" LIMIT ? OFFSET ?");
            values.push(Value::Integer(page.limit.map_or(-1, i64::from)));
            values.push(Value::Integer(i64::from(page.offset)));
        }
        sql.push(';');

        let records = self.logged("list", self.query_records(&sql, values))?;
        debug!(
            "event=repo_list module=repo backend=sqlite status=ok collection={} count={}",
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
            // `IS` also matches NULL = NULL, which plain `=` never does.
            let mut sql = format!(
                "{} WHERE {} IS ?1 ORDER BY {} ASC",
                self.select_sql,
                quote(def.name),
                quote(self.schema.id_field)
            );
            let mut values = vec![value_to_sql(value)];
            if let Some(limit) = limit {
                sql.push_str(" LIMIT ?2");
                values.push(Value::Integer(i64::from(limit)));
            }
            sql.push(';');
            self.query_records(&sql, values)
        });
        self.logged("find", result)
    }

    fn update(&self, id: &RecordId, changes: &Fields) -> RepoResult<Option<Record>> {
        let checked = self
            .schema
            .check_id(id)
            .and_then(|()| self.schema.check_update(changes));
        self.logged("update", checked)?;

        if changes.is_empty() {
            debug!(
                "event=repo_update module=repo backend=sqlite status=noop collection={} id={id}",
                self.schema.name
            );
            return self.get_by_id(id);
        }

        let assignments = changes
            .keys()
            .enumerate()
            .map(|(index, name)| format!("{} = ?{}", quote(name), index + 1))
            .collect::<Vec<_>>();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{};",
            quote(self.schema.name),
            assignments.join(", "),
            quote(self.schema.id_field),
            changes.len() + 1
        );
        let mut values = changes.values().map(value_to_sql).collect::<Vec<_>>();
        values.push(id_to_sql(id));

        let changed = self.logged(
            "update",
            self.conn
                .execute(&sql, params_from_iter(values))
                .map_err(PersistenceError::from),
        )?;
        if changed == 0 {
            return Ok(None);
        }

        info!(
            "event=repo_update module=repo backend=sqlite status=ok collection={} id={id} fields={}",
            self.schema.name,
            changes.len()
        );
        self.logged("update", self.read_back(id)).map(Some)
    }

    fn delete(&self, id: &RecordId) -> RepoResult<bool> {
        let result = self.schema.check_id(id).and_then(|()| {
            let sql = format!(
                "DELETE FROM {} WHERE {} = ?1;",
                quote(self.schema.name),
                quote(self.schema.id_field)
            );
            Ok(self.conn.execute(&sql, [id_to_sql(id)])? > 0)
        });
        let deleted = self.logged("delete", result)?;
        info!(
            "event=repo_delete module=repo backend=sqlite status=ok collection={} id={id} deleted={deleted}",
            self.schema.name
        );
        Ok(deleted)
    }

    fn count(&self) -> RepoResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {};", quote(self.schema.name));
        let result = self
            .conn
            .query_row(&sql, [], |row| row.get::<_, i64>(0))
            .map_err(PersistenceError::from)
            .and_then(|count| {
                u64::try_from(count).map_err(|_| {
                    PersistenceError::InvalidData(format!("negative row count {count}"))
                })
            });
        self.logged("count", result)
    }
}

fn ensure_table_matches(conn: &Connection, schema: &CollectionSchema) -> RepoResult<()> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let columns = stmt
        .query_map([schema.name], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    if columns.is_empty() {
        return Err(PersistenceError::InvalidSchema(format!(
            "table `{}` does not exist",
            schema.name
        )));
    }

    let expected = std::iter::once(schema.id_field).chain(schema.fields.iter().map(|f| f.name));
    for name in expected {
        if !columns.iter().any(|column| column == name) {
            return Err(PersistenceError::InvalidSchema(format!(
                "table `{}` has no column `{name}`",
                schema.name
            )));
        }
    }
    Ok(())
}

fn parse_row(schema: &CollectionSchema, row: &Row<'_>) -> RepoResult<Record> {
    let id = match schema.id_kind {
        IdKind::Integer => RecordId::Int(row.get(0)?),
        IdKind::Text => RecordId::Text(row.get(0)?),
    };

    let mut fields = Fields::new();
    for (offset, field) in schema.fields.iter().enumerate() {
        let index = offset + 1;
        let value = match field.kind {
            FieldKind::Integer => row.get::<_, Option<i64>>(index)?.map(FieldValue::Integer),
            FieldKind::Timestamp => row.get::<_, Option<i64>>(index)?.map(FieldValue::Timestamp),
            FieldKind::Real => row.get::<_, Option<f64>>(index)?.map(FieldValue::Real),
            FieldKind::Text => row.get::<_, Option<String>>(index)?.map(FieldValue::Text),
        };
        let value = match value {
            Some(value) => value,
            None if field.nullable => FieldValue::Null,
            None => {
                return Err(PersistenceError::InvalidData(format!(
                    "NULL in non-nullable column `{}`.`{}` for id `{id}`",
                    schema.name, field.name
                )));
            }
        };
        fields.insert(field.name.to_string(), value);
    }

    Ok(Record { id, fields })
}

fn value_to_sql(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Integer(value) | FieldValue::Timestamp(value) => Value::Integer(*value),
        FieldValue::Real(value) => Value::Real(*value),
        FieldValue::Text(value) => Value::Text(value.clone()),
    }
}

fn id_to_sql(id: &RecordId) -> Value {
    match id {
        RecordId::Int(value) => Value::Integer(*value),
        RecordId::Text(value) => Value::Text(value.clone()),
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}
