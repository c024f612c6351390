//! Postgres-backed store adapter (typed, schema-defined table).
//!
//! A table is described by a [`TableSchema`] and must be synchronized with
//! [`PostgresStore::define_model`] (create-if-absent) before the store is
//! built; the returned [`TableModel`] is the proof of that.
//!
//! Rows are converted to and from records through `jsonb`: inserts and
//! updates go through `jsonb_populate_record`, reads return `to_jsonb(row)`.
//! Every table carries a `SERIAL` primary key `id`; ids compare as text, so
//! a non-numeric id matches nothing. Upserts need an integer id and push
//! the serial sequence past it, so later inserts never collide.
//!
//! ## Filters
//!
//! | Condition | SQL |
//! |-----------|-----|
//! | `Equals`  | `to_jsonb(t) @> {field: value}` |
//! | `Contains`| `to_jsonb(t) ->> field LIKE '%text%'` (metacharacters escaped) |
//!
//! Only schema columns may be filtered on; anything else is an
//! [`CrudError::InvalidFilter`].

use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row};
use tracing::instrument;

use heroes_core::{Record, RecordId};

use super::{Condition, Crud, CrudError, Filter, MutationOutcome, Page, Stored, from_object, to_object};
use crate::config::PostgresConfig;

const ID: &str = "id";

/// One non-key column: name plus SQL type/constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub definition: &'static str,
}

/// Table shape. `id SERIAL PRIMARY KEY` is implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl TableSchema {
    fn has_column(&self, name: &str) -> bool {
        name == ID || self.columns.iter().any(|c| c.name == name)
    }

    fn validate(&self) -> Result<(), CrudError> {
        std::iter::once(self.name)
            .chain(self.columns.iter().map(|c| c.name))
            .try_for_each(|ident| {
                if is_identifier(ident) && ident != ID {
                    Ok(())
                } else {
                    Err(CrudError::InvalidRecord(format!("invalid identifier in schema: {ident:?}")))
                }
            })
    }

    pub fn create_table_sql(&self) -> String {
        let mut columns = vec![format!("{} SERIAL PRIMARY KEY", quote(ID))];
        columns.extend(
            self.columns
                .iter()
                .map(|c| format!("{} {}", quote(c.name), c.definition)),
        );
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote(self.name),
            columns.join(", ")
        )
    }
}

/// A table that has been synchronized and is ready for CRUD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableModel {
    schema: TableSchema,
}

impl TableModel {
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }
}

/// Postgres table adapter.
///
/// Uses the SQLx connection pool, which is thread-safe and shared by clones.
#[derive(Debug, Clone)]
pub struct PostgresStore<R> {
    pool: PgPool,
    schema: TableSchema,
    _record: PhantomData<fn() -> R>,
}

impl<R> PostgresStore<R> {
    /// Open a connection pool. With `ssl` set, transport encryption is required.
    pub async fn connect(config: &PostgresConfig) -> Result<PgPool, CrudError> {
        let mut options: PgConnectOptions = config
            .url
            .parse()
            .map_err(|e: sqlx::Error| CrudError::Connection(e.to_string()))?;
        if config.ssl {
            options = options.ssl_mode(PgSslMode::Require);
        }

        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| CrudError::Connection(e.to_string()))
    }

    /// Register the table shape and create the table if it does not exist.
    ///
    /// Must complete before the first CRUD call on the table.
    pub async fn define_model(pool: &PgPool, schema: TableSchema) -> Result<TableModel, CrudError> {
        schema.validate()?;
        sqlx::query(&schema.create_table_sql())
            .execute(pool)
            .await
            .map_err(backend)?;
        tracing::info!(table = schema.name, "table synchronized");
        Ok(TableModel { schema })
    }

    pub fn new(pool: PgPool, model: TableModel) -> Self {
        Self {
            pool,
            schema: model.schema,
            _record: PhantomData,
        }
    }
}

fn backend(e: sqlx::Error) -> CrudError {
    CrudError::Backend(e.to_string())
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn quote(ident: &str) -> String {
    format!("\"{ident}\"")
}

fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[derive(Debug, Clone, PartialEq)]
enum Bind {
    Json(Value),
    Text(String),
    BigInt(i64),
    OptBigInt(Option<i64>),
}

fn bind_all<'q>(mut query: Query<'q, Postgres, PgArguments>, binds: Vec<Bind>) -> Query<'q, Postgres, PgArguments> {
    for bind in binds {
        query = match bind {
            Bind::Json(v) => query.bind(Json(v)),
            Bind::Text(s) => query.bind(s),
            Bind::BigInt(n) => query.bind(n),
            Bind::OptBigInt(n) => query.bind(n),
        };
    }
    query
}

/// Keys of `body`, checked against the schema.
fn body_columns<'a>(schema: &TableSchema, body: &'a Map<String, Value>) -> Result<Vec<&'a str>, CrudError> {
    body.keys()
        .map(|k| {
            if k != ID && schema.has_column(k) {
                Ok(k.as_str())
            } else {
                Err(CrudError::InvalidRecord(format!(
                    "{k:?} is not a column of {}",
                    schema.name
                )))
            }
        })
        .collect()
}

fn insert_sql(schema: &TableSchema, columns: &[&str]) -> String {
    let table = quote(schema.name);
    if columns.is_empty() {
        return format!("INSERT INTO {table} DEFAULT VALUES RETURNING to_jsonb({table}.*) AS doc");
    }
    let names = columns.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ");
    let values = columns
        .iter()
        .map(|c| format!("r.{}", quote(c)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {table} ({names}) SELECT {values} FROM jsonb_populate_record(NULL::{table}, $1) AS r \
         RETURNING to_jsonb({table}.*) AS doc"
    )
}

fn select_sql(schema: &TableSchema, filter: &Filter, page: Page) -> Result<(String, Vec<Bind>), CrudError> {
    filter.ensure_no_id_conditions()?;
    let mut sql = format!("SELECT to_jsonb(t) AS doc FROM {} AS t WHERE TRUE", quote(schema.name));
    let mut binds = Vec::new();
    let mut exact = Map::new();

    for condition in filter.conditions() {
        let field = match condition {
            Condition::Equals { field, .. } | Condition::Contains { field, .. } => field,
        };
        if !schema.has_column(field) {
            return Err(CrudError::InvalidFilter(format!(
                "{field:?} is not a column of {}",
                schema.name
            )));
        }
        match condition {
            Condition::Equals { field, value } => {
                exact.insert(field.clone(), value.clone());
            }
            Condition::Contains { field, text } => {
                binds.push(Bind::Text(field.clone()));
                binds.push(Bind::Text(escape_like(text)));
                let (f, p) = (binds.len() - 1, binds.len());
                sql.push_str(&format!(r" AND (to_jsonb(t) ->> ${f}) LIKE ${p} ESCAPE '\'"));
            }
        }
    }

    if !exact.is_empty() {
        binds.push(Bind::Json(Value::Object(exact)));
        sql.push_str(&format!(" AND to_jsonb(t) @> ${}", binds.len()));
    }

    binds.push(Bind::BigInt(page.skip_i64()));
    binds.push(Bind::OptBigInt(page.limit_i64()));
    sql.push_str(&format!(
        " ORDER BY t.{} OFFSET ${} LIMIT ${}",
        quote(ID),
        binds.len() - 1,
        binds.len()
    ));

    Ok((sql, binds))
}

fn set_list(columns: &[&str], source: &str) -> String {
    if columns.is_empty() {
        // Nothing to change; still touch the row so it counts as matched.
        return format!("{id} = {source}.{id}", id = quote(ID));
    }
    columns
        .iter()
        .map(|c| format!("{col} = {source}.{col}", col = quote(c)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn update_sql(schema: &TableSchema, columns: &[&str]) -> String {
    let table = quote(schema.name);
    let source = if columns.is_empty() { table.as_str() } else { "r" };
    format!(
        "UPDATE {table} SET {} FROM jsonb_populate_record(NULL::{table}, $1) AS r WHERE {table}.{}::text = $2",
        set_list(columns, source),
        quote(ID)
    )
}

fn upsert_sql(schema: &TableSchema, columns: &[&str]) -> String {
    let table = quote(schema.name);
    let mut all = vec![ID];
    all.extend_from_slice(columns);
    let names = all.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ");
    let values = all
        .iter()
        .map(|c| format!("r.{}", quote(c)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {table} ({names}) SELECT {values} FROM jsonb_populate_record(NULL::{table}, $1) AS r \
         ON CONFLICT ({}) DO UPDATE SET {} RETURNING (xmax = 0) AS inserted",
        quote(ID),
        set_list(columns, "EXCLUDED")
    )
}

/// Move the table's serial sequence to at least `id`; `$1` is the upserted key.
fn advance_sequence_sql(schema: &TableSchema) -> String {
    let sequence = format!(
        "pg_get_serial_sequence('{}', '{}')",
        quote(schema.name),
        ID
    );
    format!("SELECT setval({sequence}, GREATEST(nextval({sequence}), $1))")
}

fn upsert_key(id: &RecordId) -> Result<i64, CrudError> {
    id.as_str()
        .parse::<i64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| CrudError::InvalidRecord(format!("upsert id '{id}' is not a positive integer")))
}

fn row_to_stored<R: Record>(doc: Value) -> Result<Stored<R>, CrudError> {
    let Value::Object(mut body) = doc else {
        return Err(CrudError::Serialization("row is not an object".to_string()));
    };
    let id = match body.remove(ID) {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(RecordId::from)
            .ok_or_else(|| CrudError::Serialization(format!("non-integer id {n}")))?,
        Some(Value::String(s)) => RecordId::from(s),
        other => {
            return Err(CrudError::Serialization(format!("unexpected id {other:?}")));
        }
    };
    from_object(id, body)
}

#[async_trait]
impl<R: Record> Crud<R> for PostgresStore<R> {
    #[instrument(skip(self, item), fields(table = self.schema.name))]
    async fn create(&self, item: R) -> Result<Stored<R>, CrudError> {
        let body = to_object(&item)?;
        let columns = body_columns(&self.schema, &body)?;
        let sql = insert_sql(&self.schema, &columns);

        let mut query = sqlx::query(&sql);
        if !columns.is_empty() {
            query = query.bind(Json(Value::Object(body.clone())));
        }
        let row = query.fetch_one(&self.pool).await.map_err(backend)?;
        let doc: Json<Value> = row.try_get("doc").map_err(backend)?;
        row_to_stored(doc.0)
    }

    #[instrument(skip(self), fields(table = self.schema.name))]
    async fn read(&self, filter: &Filter, page: Page) -> Result<Vec<Stored<R>>, CrudError> {
        let (sql, binds) = select_sql(&self.schema, filter, page)?;
        let rows = bind_all(sqlx::query(&sql), binds)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        rows.into_iter()
            .map(|row| {
                let doc: Json<Value> = row.try_get("doc").map_err(backend)?;
                row_to_stored(doc.0)
            })
            .collect()
    }

    #[instrument(skip(self, patch), fields(table = self.schema.name))]
    async fn update(
        &self,
        id: &RecordId,
        patch: &R::Patch,
        upsert: bool,
    ) -> Result<MutationOutcome, CrudError> {
        let mut body = to_object(patch)?;
        let columns: Vec<String> = body_columns(&self.schema, &body)?
            .into_iter()
            .map(str::to_string)
            .collect();
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();

        if !upsert {
            let result = sqlx::query(&update_sql(&self.schema, &columns))
                .bind(Json(Value::Object(body)))
                .bind(id.as_str())
                .execute(&self.pool)
                .await
                .map_err(backend)?;
            return Ok(MutationOutcome::affected(result.rows_affected()));
        }

        let key = upsert_key(id)?;
        body.insert(ID.to_string(), Value::from(key));

        let mut tx = self.pool.begin().await.map_err(backend)?;
        let row = sqlx::query(&upsert_sql(&self.schema, &columns))
            .bind(Json(Value::Object(body)))
            .fetch_one(&mut *tx)
            .await
            .map_err(backend)?;
        let inserted: bool = row.try_get("inserted").map_err(backend)?;
        if inserted {
            sqlx::query(&advance_sequence_sql(&self.schema))
                .bind(key)
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
        }
        tx.commit().await.map_err(backend)?;

        Ok(if inserted {
            MutationOutcome::upserted(id.clone())
        } else {
            MutationOutcome::affected(1)
        })
    }

    #[instrument(skip(self), fields(table = self.schema.name))]
    async fn delete(&self, id: Option<&RecordId>) -> Result<MutationOutcome, CrudError> {
        let table = quote(self.schema.name);
        let result = match id {
            Some(id) => {
                sqlx::query(&format!("DELETE FROM {table} WHERE {}::text = $1", quote(ID)))
                    .bind(id.as_str())
                    .execute(&self.pool)
                    .await
            }
            None => sqlx::query(&format!("DELETE FROM {table}")).execute(&self.pool).await,
        }
        .map_err(backend)?;
        Ok(MutationOutcome::affected(result.rows_affected()))
    }

    async fn is_connected(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "postgres liveness check failed");
                false
            }
        }
    }
}
