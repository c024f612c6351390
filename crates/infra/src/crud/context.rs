use std::sync::Arc;

use heroes_core::{Record, RecordId};

use super::{Crud, CrudError, Filter, MutationOutcome, Page, Stored};

/// Storage-agnostic handle over exactly one store adapter.
///
/// Forwards every call unchanged: no retry, caching or mapping. Cloning is
/// cheap and clones share the same adapter; separate contexts built from
/// separate adapters never share state.
pub struct Context<R: Record> {
    store: Arc<dyn Crud<R>>,
}

impl<R: Record> Clone for Context<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<R: Record> Context<R> {
    pub fn new(store: impl Crud<R> + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn from_arc(store: Arc<dyn Crud<R>>) -> Self {
        Self { store }
    }

    pub async fn create(&self, item: R) -> Result<Stored<R>, CrudError> {
        self.store.create(item).await
    }

    pub async fn read(&self, filter: &Filter, page: Page) -> Result<Vec<Stored<R>>, CrudError> {
        self.store.read(filter, page).await
    }

    pub async fn update(
        &self,
        id: &RecordId,
        patch: &R::Patch,
        upsert: bool,
    ) -> Result<MutationOutcome, CrudError> {
        self.store.update(id, patch, upsert).await
    }

    pub async fn delete(&self, id: Option<&RecordId>) -> Result<MutationOutcome, CrudError> {
        self.store.delete(id).await
    }

    pub async fn is_connected(&self) -> bool {
        self.store.is_connected().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crud::InMemoryStore;
    use heroes_core::{Hero, User};

    #[tokio::test]
    async fn two_contexts_do_not_share_records() {
        let heroes: Context<Hero> = Context::new(InMemoryStore::new());
        let other: Context<Hero> = Context::new(InMemoryStore::new());
        let users: Context<User> = Context::new(InMemoryStore::new());

        heroes.create(Hero::new("Batman", "Dinheiro").unwrap()).await.unwrap();
        users.create(User::new("admin", "hash")).await.unwrap();

        assert_eq!(heroes.read(&Filter::all(), Page::all()).await.unwrap().len(), 1);
        assert!(other.read(&Filter::all(), Page::all()).await.unwrap().is_empty());
        assert_eq!(users.read(&Filter::all(), Page::all()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clones_share_the_adapter() {
        let a: Context<Hero> = Context::new(InMemoryStore::new());
        let b = a.clone();
        a.create(Hero::new("Flash", "Velocidade").unwrap()).await.unwrap();
        assert_eq!(b.read(&Filter::all(), Page::all()).await.unwrap().len(), 1);
    }
}
