//! MongoDB-backed store adapter (schema-less collection).
//!
//! ## Id mapping
//!
//! Records live under `_id`. Generated ids are `ObjectId`s and travel as
//! their hex form. An id that does not parse as an `ObjectId` is matched as
//! a plain string `_id`, so it simply matches nothing for generated records.
//!
//! ## Filters
//!
//! | Condition | BSON |
//! |-----------|------|
//! | `Equals`  | `{ field: value }` |
//! | `Contains`| `{ field: { $regex: <escaped text> } }` |
//!
//! Field names pass through to the native query unchecked.

use std::marker::PhantomData;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, Bson, Document, doc, oid::ObjectId};
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Collection, Database};
use tracing::instrument;

use heroes_core::{Record, RecordId};

use super::{Condition, Crud, CrudError, Filter, MutationOutcome, Page, Stored};

/// MongoDB collection adapter.
#[derive(Debug, Clone)]
pub struct MongoStore<R> {
    database: Database,
    collection: Collection<Document>,
    _record: PhantomData<fn() -> R>,
}

impl<R> MongoStore<R> {
    /// Open a client for `url`. The driver pools and shares it internally.
    pub async fn connect(url: &str) -> Result<Client, CrudError> {
        let options = ClientOptions::parse(url)
            .await
            .map_err(|e| CrudError::Connection(e.to_string()))?;
        Client::with_options(options).map_err(|e| CrudError::Connection(e.to_string()))
    }

    /// Bind the adapter to `database.collection`.
    pub fn new(client: &Client, database: &str, collection: &str) -> Self {
        let database = client.database(database);
        let collection = database.collection::<Document>(collection);
        Self {
            database,
            collection,
            _record: PhantomData,
        }
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }
}

fn backend(e: mongodb::error::Error) -> CrudError {
    CrudError::Backend(e.to_string())
}

fn id_bson(id: &RecordId) -> Bson {
    match ObjectId::parse_str(id.as_str()) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(id.as_str().to_string()),
    }
}

fn id_from_bson(value: &Bson) -> RecordId {
    let raw = match value {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    };
    RecordId::from(raw)
}

/// Translate a [`Filter`] into a BSON query document.
pub(crate) fn filter_document(filter: &Filter) -> Result<Document, CrudError> {
    let mut query = Document::new();
    for condition in filter.conditions() {
        match condition {
            Condition::Equals { field, value } => {
                let value = bson::to_bson(value).map_err(|e| CrudError::InvalidFilter(e.to_string()))?;
                query.insert(field.clone(), value);
            }
            Condition::Contains { field, text } => {
                query.insert(field.clone(), doc! { "$regex": regex::escape(text) });
            }
        }
    }
    Ok(query)
}

impl<R> MongoStore<R> {
    /// Empty patch: `$set: {}` is a server error, so report the match count
    /// directly and insert a bare document when upserting a missing id.
    async fn touch(&self, id: &RecordId, upsert: bool) -> Result<MutationOutcome, CrudError> {
        let key = id_bson(id);
        let matched = self
            .collection
            .count_documents(doc! { "_id": key.clone() })
            .await
            .map_err(backend)?;
        if matched > 0 || !upsert {
            return Ok(MutationOutcome::affected(matched));
        }

        let inserted = self
            .collection
            .insert_one(doc! { "_id": key })
            .await
            .map_err(backend)?;
        Ok(MutationOutcome::upserted(id_from_bson(&inserted.inserted_id)))
    }
}

/// Stable `_id` order with the page window. A negative limit means
/// "single batch" to the server, so oversized limits go out unbounded.
fn find_options(page: Page) -> FindOptions {
    let mut options = FindOptions::default();
    options.sort = Some(doc! { "_id": 1 });
    options.skip = Some(page.skip.min(i64::MAX as u64));
    options.limit = page.limit_i64();
    options
}

fn into_stored<R: Record>(mut document: Document) -> Result<Stored<R>, CrudError> {
    let id = document
        .remove("_id")
        .map(|v| id_from_bson(&v))
        .ok_or_else(|| CrudError::Serialization("document without _id".to_string()))?;
    let record = bson::from_document(document).map_err(|e| CrudError::Serialization(e.to_string()))?;
    Ok(Stored { id, record })
}

#[async_trait]
impl<R: Record> Crud<R> for MongoStore<R> {
    #[instrument(skip(self, item), fields(collection = %self.collection.name()))]
    async fn create(&self, item: R) -> Result<Stored<R>, CrudError> {
        let document = bson::to_document(&item).map_err(|e| CrudError::Serialization(e.to_string()))?;
        let inserted = self.collection.insert_one(document).await.map_err(backend)?;
        Ok(Stored {
            id: id_from_bson(&inserted.inserted_id),
            record: item,
        })
    }

    #[instrument(skip(self), fields(collection = %self.collection.name()))]
    async fn read(&self, filter: &Filter, page: Page) -> Result<Vec<Stored<R>>, CrudError> {
        filter.ensure_no_id_conditions()?;
        // The server reads limit 0 as "no limit".
        if page.is_empty() {
            return Ok(Vec::new());
        }
        let query = filter_document(filter)?;

        let documents: Vec<Document> = self
            .collection
            .find(query)
            .with_options(find_options(page))
            .await
            .map_err(backend)?
            .try_collect()
            .await
            .map_err(backend)?;

        documents.into_iter().map(into_stored).collect()
    }

    #[instrument(skip(self, patch), fields(collection = %self.collection.name()))]
    async fn update(
        &self,
        id: &RecordId,
        patch: &R::Patch,
        upsert: bool,
    ) -> Result<MutationOutcome, CrudError> {
        let fields = bson::to_document(patch).map_err(|e| CrudError::Serialization(e.to_string()))?;
        if fields.is_empty() {
            return self.touch(id, upsert).await;
        }
        let result = self
            .collection
            .update_one(doc! { "_id": id_bson(id) }, doc! { "$set": fields })
            .upsert(upsert)
            .await
            .map_err(backend)?;

        Ok(match result.upserted_id {
            Some(created) => MutationOutcome::upserted(id_from_bson(&created)),
            None => MutationOutcome::affected(result.matched_count),
        })
    }

    #[instrument(skip(self), fields(collection = %self.collection.name()))]
    async fn delete(&self, id: Option<&RecordId>) -> Result<MutationOutcome, CrudError> {
        let result = match id {
            Some(id) => self.collection.delete_one(doc! { "_id": id_bson(id) }).await,
            None => self.collection.delete_many(doc! {}).await,
        }
        .map_err(backend)?;
        Ok(MutationOutcome::affected(result.deleted_count))
    }

    async fn is_connected(&self) -> bool {
        match self.database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "mongodb ping failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heroes_core::Hero;

    #[test]
    fn contains_becomes_escaped_regex() {
        let query = filter_document(&Filter::all().contains("nome", "Bat.man")).unwrap();
        assert_eq!(query, doc! { "nome": { "$regex": "Bat\\.man" } });
    }

    #[test]
    fn equals_becomes_plain_match() {
        let query = filter_document(&Filter::all().eq("username", "admin")).unwrap();
        assert_eq!(query, doc! { "username": "admin" });
        assert_eq!(filter_document(&Filter::all()).unwrap(), doc! {});
    }

    #[test]
    fn ids_map_to_object_ids_when_possible() {
        let oid = ObjectId::new();
        let id: RecordId = oid.to_hex().parse().unwrap();
        assert_eq!(id_bson(&id), Bson::ObjectId(oid));
        assert_eq!(id_from_bson(&Bson::ObjectId(oid)), id);

        let plain: RecordId = "0".parse().unwrap();
        assert_eq!(id_bson(&plain), Bson::String("0".into()));
    }

    #[test]
    fn find_options_never_send_negative_bounds() {
        let options = find_options(Page::new(u64::MAX, u64::MAX));
        assert_eq!(options.skip, Some(i64::MAX as u64));
        assert_eq!(options.limit, None);

        let options = find_options(Page::new(10, 10));
        assert_eq!(options.skip, Some(10));
        assert_eq!(options.limit, Some(10));
        assert_eq!(options.sort, Some(doc! { "_id": 1 }));
    }

    #[test]
    fn documents_split_into_id_and_record() {
        let oid = ObjectId::new();
        let stored: Stored<Hero> =
            into_stored(doc! { "_id": oid, "nome": "Flash", "poder": "Velocidade", "__v": 0 }).unwrap();
        assert_eq!(stored.id.as_str(), oid.to_hex());
        assert_eq!(stored.record, Hero::new("Flash", "Velocidade").unwrap());
    }

    /// Runs against a live server when `TEST_MONGODB_URL` is set.
    #[tokio::test]
    async fn passes_crud_conformance_against_live_server() {
        let Ok(url) = std::env::var("TEST_MONGODB_URL") else {
            eprintln!("TEST_MONGODB_URL not set; skipping");
            return;
        };
        let client = MongoStore::<Hero>::connect(&url).await.unwrap();
        let store = MongoStore::<Hero>::new(&client, "heroes_test", "herois_conformance");
        assert!(store.is_connected().await);
        crate::crud::conformance::run_all(&store).await;
    }
}
