//! Storage-agnostic CRUD boundary.
//!
//! Every backing store is reached through the [`Crud`] capability. Route
//! handlers only ever hold a [`Context`], so the same handler code runs
//! against MongoDB, Postgres or the in-memory store.
//!
//! ## Contract
//!
//! - `create` returns the stored record together with its generated id.
//! - `read` applies a [`Filter`] (all conditions must hold) and a [`Page`].
//!   An empty filter matches every record. Ids are not filterable; a
//!   condition on `_id`/`id` is an [`CrudError::InvalidFilter`].
//! - `update` merges a partial record into the record with the given id.
//!   An empty patch changes nothing but still reports the match.
//!   With `upsert = true` a missing record is created under that id; an
//!   adapter that cannot store ids of that shape answers
//!   [`CrudError::InvalidRecord`] (Postgres keys are integers).
//! - `delete` removes the record with the given id, or every record when no
//!   id is given.
//!
//! Mutations report a [`MutationOutcome`]. `affected` counts the records the
//! mutation matched, the same way for every adapter; id-scoped mutations
//! succeeded iff exactly one record was affected.
//!
//! Adapters let store failures surface as [`CrudError`]; nothing is retried.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use heroes_core::{Record, RecordId};

pub mod context;
pub mod in_memory;
pub mod mongo;
pub mod postgres;

#[cfg(test)]
mod conformance;

pub use context::Context;
pub use in_memory::InMemoryStore;
pub use mongo::MongoStore;
pub use postgres::{Column, PostgresStore, TableModel, TableSchema};

/// A record as held by a store: its generated id plus its body.
///
/// Serializes flat, with the id under `_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stored<R> {
    #[serde(rename = "_id")]
    pub id: RecordId,

    #[serde(flatten)]
    pub record: R,
}

/// One condition on a serialized field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value exactly.
    Equals { field: String, value: Value },
    /// Field is a string containing `text` (case-sensitive).
    Contains { field: String, text: String },
}

/// Conjunction of field conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Match everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Equals {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn contains(mut self, field: impl Into<String>, text: impl Into<String>) -> Self {
        self.conditions.push(Condition::Contains {
            field: field.into(),
            text: text.into(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Field names every adapter reserves for the record id.
    const ID_FIELDS: [&'static str; 2] = ["_id", "id"];

    /// Reject conditions on the record id. Adapters call this before
    /// translating the filter.
    pub(crate) fn ensure_no_id_conditions(&self) -> Result<(), CrudError> {
        match self.conditions.iter().find_map(|c| {
            let field = match c {
                Condition::Equals { field, .. } | Condition::Contains { field, .. } => field,
            };
            Self::ID_FIELDS.iter().any(|id| *id == field.as_str()).then_some(field)
        }) {
            Some(field) => Err(CrudError::InvalidFilter(format!(
                "{field:?} is the record id; use the id-scoped operations"
            ))),
            None => Ok(()),
        }
    }

    /// Evaluate the filter against a serialized record body.
    pub fn matches(&self, body: &Map<String, Value>) -> bool {
        self.conditions.iter().all(|c| match c {
            Condition::Equals { field, value } => body.get(field) == Some(value),
            Condition::Contains { field, text } => body
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| s.contains(text.as_str())),
        })
    }
}

/// Bounded-offset window over a result set.
///
/// `limit: Some(0)` yields nothing in every adapter. Values past `i64::MAX`
/// saturate, so an oversized `skip` yields nothing and an oversized `limit`
/// is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: Option<u64>,
}

impl Page {
    /// No bounds.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(skip: u64, limit: u64) -> Self {
        Self {
            skip,
            limit: Some(limit),
        }
    }

    /// Window that cannot contain any record.
    pub fn is_empty(&self) -> bool {
        self.limit == Some(0)
    }

    pub(crate) fn skip_i64(&self) -> i64 {
        i64::try_from(self.skip).unwrap_or(i64::MAX)
    }

    /// `None` when unbounded (including limits past `i64::MAX`).
    pub(crate) fn limit_i64(&self) -> Option<i64> {
        self.limit.and_then(|l| i64::try_from(l).ok())
    }
}

/// Result of an update or delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Records matched by the mutation (including one created by upsert).
    pub affected: u64,

    /// Id of the record created by an upsert, if one was created.
    pub upserted_id: Option<RecordId>,
}

impl MutationOutcome {
    pub fn affected(affected: u64) -> Self {
        Self {
            affected,
            upserted_id: None,
        }
    }

    pub fn upserted(id: RecordId) -> Self {
        Self {
            affected: 1,
            upserted_id: Some(id),
        }
    }

    /// Success predicate for id-scoped mutations.
    pub fn is_exactly_one(&self) -> bool {
        self.affected == 1
    }
}

/// Store operation error.
///
/// These are infrastructure failures; "no such id" is not an error but an
/// outcome with `affected == 0`.
#[derive(Debug, Error)]
pub enum CrudError {
    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("store operation failed: {0}")]
    Backend(String),

    #[error("record (de)serialization failed: {0}")]
    Serialization(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// The four operations every store adapter supports.
#[async_trait]
pub trait Crud<R: Record>: Send + Sync {
    async fn create(&self, item: R) -> Result<Stored<R>, CrudError>;

    async fn read(&self, filter: &Filter, page: Page) -> Result<Vec<Stored<R>>, CrudError>;

    async fn update(
        &self,
        id: &RecordId,
        patch: &R::Patch,
        upsert: bool,
    ) -> Result<MutationOutcome, CrudError>;

    async fn delete(&self, id: Option<&RecordId>) -> Result<MutationOutcome, CrudError>;

    /// Liveness probe for health checks. Never fails; `false` means unreachable.
    async fn is_connected(&self) -> bool {
        true
    }
}

#[async_trait]
impl<R, S> Crud<R> for Arc<S>
where
    R: Record,
    S: Crud<R> + ?Sized,
{
    async fn create(&self, item: R) -> Result<Stored<R>, CrudError> {
        (**self).create(item).await
    }

    async fn read(&self, filter: &Filter, page: Page) -> Result<Vec<Stored<R>>, CrudError> {
        (**self).read(filter, page).await
    }

    async fn update(
        &self,
        id: &RecordId,
        patch: &R::Patch,
        upsert: bool,
    ) -> Result<MutationOutcome, CrudError> {
        (**self).update(id, patch, upsert).await
    }

    async fn delete(&self, id: Option<&RecordId>) -> Result<MutationOutcome, CrudError> {
        (**self).delete(id).await
    }

    async fn is_connected(&self) -> bool {
        (**self).is_connected().await
    }
}

/// Serialize a record or patch into a JSON object body.
pub(crate) fn to_object<T: Serialize + ?Sized>(value: &T) -> Result<Map<String, Value>, CrudError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CrudError::InvalidRecord(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(CrudError::Serialization(e.to_string())),
    }
}

/// Rebuild a typed record from a JSON object body.
pub(crate) fn from_object<R: Record>(id: RecordId, body: Map<String, Value>) -> Result<Stored<R>, CrudError> {
    let record = serde_json::from_value(Value::Object(body))
        .map_err(|e| CrudError::Serialization(e.to_string()))?;
    Ok(Stored { id, record })
}
