use std::marker::PhantomData;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{Map, Value};

use heroes_core::{Record, RecordId};

use super::{Crud, CrudError, Filter, MutationOutcome, Page, Stored, from_object, to_object};

/// In-memory store for tests/dev.
///
/// Keeps serialized bodies in insertion order and evaluates filters with
/// [`Filter::matches`]. Not optimized for performance.
#[derive(Debug)]
pub struct InMemoryStore<R> {
    rows: RwLock<Vec<(RecordId, Map<String, Value>)>>,
    _record: PhantomData<fn() -> R>,
}

impl<R> InMemoryStore<R> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            _record: PhantomData,
        }
    }
}

impl<R> Default for InMemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> CrudError {
    CrudError::Backend("lock poisoned".to_string())
}

#[async_trait]
impl<R: Record> Crud<R> for InMemoryStore<R> {
    async fn create(&self, item: R) -> Result<Stored<R>, CrudError> {
        let body = to_object(&item)?;
        let id = RecordId::generate();
        self.rows
            .write()
            .map_err(|_| poisoned())?
            .push((id.clone(), body));
        Ok(Stored { id, record: item })
    }

    async fn read(&self, filter: &Filter, page: Page) -> Result<Vec<Stored<R>>, CrudError> {
        filter.ensure_no_id_conditions()?;
        let rows = self.rows.read().map_err(|_| poisoned())?;
        let skip = usize::try_from(page.skip).unwrap_or(usize::MAX);
        let limit = page
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        rows.iter()
            .filter(|(_, body)| filter.matches(body))
            .skip(skip)
            .take(limit)
            .map(|(id, body)| from_object(id.clone(), body.clone()))
            .collect()
    }

    async fn update(
        &self,
        id: &RecordId,
        patch: &R::Patch,
        upsert: bool,
    ) -> Result<MutationOutcome, CrudError> {
        let fields = to_object(patch)?;
        let mut rows = self.rows.write().map_err(|_| poisoned())?;

        if let Some((_, body)) = rows.iter_mut().find(|(row_id, _)| row_id == id) {
            body.extend(fields);
            return Ok(MutationOutcome::affected(1));
        }

        if upsert {
            rows.push((id.clone(), fields));
            return Ok(MutationOutcome::upserted(id.clone()));
        }

        Ok(MutationOutcome::affected(0))
    }

    async fn delete(&self, id: Option<&RecordId>) -> Result<MutationOutcome, CrudError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        let before = rows.len();
        match id {
            Some(id) => rows.retain(|(row_id, _)| row_id != id),
            None => rows.clear(),
        }
        Ok(MutationOutcome::affected((before - rows.len()) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crud::conformance;
    use heroes_core::Hero;

    #[tokio::test]
    async fn passes_crud_conformance() {
        conformance::run_all(&InMemoryStore::<Hero>::new()).await;
    }

    #[tokio::test]
    async fn upsert_on_missing_id_creates_record_under_that_id() {
        let store = InMemoryStore::<Hero>::new();
        let id: RecordId = "custom-1".parse().unwrap();
        let patch = heroes_core::HeroPatch {
            name: Some("Mulher Maravilha".into()),
            power: Some("Laço".into()),
        };

        let outcome = store.update(&id, &patch, true).await.unwrap();
        assert_eq!(outcome, MutationOutcome::upserted(id.clone()));

        let rows = store.read(&Filter::all().eq("nome", "Mulher Maravilha"), Page::all()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
    }

    #[tokio::test]
    async fn delete_without_id_clears_everything() {
        let store = InMemoryStore::<Hero>::new();
        for name in ["Batman", "Flash", "Aquaman"] {
            store.create(Hero::new(name, "Nenhum").unwrap()).await.unwrap();
        }
        let outcome = store.delete(None).await.unwrap();
        assert_eq!(outcome.affected, 3);
        assert!(store.read(&Filter::all(), Page::all()).await.unwrap().is_empty());
    }
}
